//! Typed server and client settings read from the environment (and `.env`).

use crate::error::ConfigError;
use regex::Regex;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::LazyLock;
use std::time::Duration;

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("static pattern"));

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Settings of the HTTP server binary.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerSettings {
    pub database_url: String,
    /// PostgreSQL schema holding the entity tables.
    pub db_schema: String,
    pub max_connections: u32,
    pub bind_addr: SocketAddr,
    pub max_body_bytes: usize,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let db_schema = lookup("DB_SCHEMA").unwrap_or_else(|| "public".into());
        if !IDENTIFIER.is_match(&db_schema) {
            return Err(ConfigError::Invalid {
                key: "DB_SCHEMA",
                value: db_schema,
            });
        }
        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| "postgres://localhost/retail_admin".into()),
            db_schema,
            max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            bind_addr: parse_or(&lookup, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", 64 * 1024)?,
        })
    }
}

/// Settings of a client driving the engine over HTTP.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout: Duration,
}

impl ClientSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secs: u64 = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30)?;
        if secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REQUEST_TIMEOUT_SECS",
                value: "0".into(),
            });
        }
        Ok(Self {
            api_base_url: lookup("API_BASE_URL").unwrap_or_else(|| "http://127.0.0.1:3000".into()),
            request_timeout: Duration::from_secs(secs),
        })
    }
}
