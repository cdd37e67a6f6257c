//! Database bootstrap: create the database if absent, then the entity tables.

use crate::error::AppError;
use crate::schema::{schema_for, EntityKind};
use crate::sql::create_table;
use sqlx::ConnectOptions;
use sqlx::PgPool;
use std::str::FromStr;

/// Creation order; referenced kinds come before the kinds that reference them.
const TABLE_ORDER: [EntityKind; 4] = [
    EntityKind::Customer,
    EntityKind::Product,
    EntityKind::Store,
    EntityKind::Sale,
];

/// Create `db_schema` if not exists, then one table per entity kind.
pub async fn ensure_tables(pool: &PgPool, db_schema: &str) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quote_ident(db_schema)))
        .execute(pool)
        .await?;
    for kind in TABLE_ORDER {
        let ddl = create_table(schema_for(kind), db_schema);
        tracing::debug!(kind = %kind, ddl = %ddl, "ensure table");
        sqlx::query(&ddl).execute(pool).await?;
    }
    tracing::info!(schema = db_schema, "entity tables ready");
    Ok(())
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), AppError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| AppError::BadRequest("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    let admin_url = format!("{}postgres", base);
    Ok((admin_url, db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
