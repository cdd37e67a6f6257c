//! Storage-API collaborator: the capability set each entity kind registers once.

mod http;

pub use http::HttpEntityApi;

use crate::error::EngineError;
use crate::model::Record;
use crate::pagination::PageRequest;
use crate::schema::{schema_for, EntityKind, EntitySchema};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// One page of records plus the total row count of the kind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Record>,
    pub total_count: u64,
}

/// Remote CRUD operations for one entity kind.
#[async_trait]
pub trait EntityApi: Send + Sync {
    async fn fetch_page(&self, page: PageRequest) -> Result<Page, EngineError>;

    /// Persist a new record; the returned record carries the assigned id.
    async fn create(&self, record: &Record) -> Result<Record, EngineError>;

    async fn update(&self, id: i64, record: &Record) -> Result<Record, EngineError>;

    /// Returns the server's confirmation message.
    async fn delete(&self, id: i64) -> Result<String, EngineError>;
}

/// Everything the engine needs to drive one kind.
#[derive(Clone)]
pub struct Capabilities {
    pub schema: &'static EntitySchema,
    pub api: Arc<dyn EntityApi>,
}

/// Registration table from entity kind to its capabilities.
#[derive(Clone, Default)]
pub struct EntityRegistry {
    entries: HashMap<EntityKind, Capabilities>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: EntityKind, api: Arc<dyn EntityApi>) -> Self {
        self.entries.insert(
            kind,
            Capabilities {
                schema: schema_for(kind),
                api,
            },
        );
        self
    }

    /// All four kinds served by the HTTP surface at `base_url`.
    pub fn http(client: reqwest::Client, base_url: &str) -> Self {
        EntityKind::ALL.into_iter().fold(Self::new(), |reg, kind| {
            reg.register(kind, Arc::new(HttpEntityApi::new(client.clone(), base_url, kind)))
        })
    }

    pub fn get(&self, kind: EntityKind) -> Result<&Capabilities, EngineError> {
        self.entries.get(&kind).ok_or_else(|| {
            tracing::warn!(kind = %kind, "no capabilities registered");
            EngineError::UnknownEntityKind(kind.name().to_string())
        })
    }

    pub fn kinds(&self) -> impl Iterator<Item = EntityKind> + '_ {
        self.entries.keys().copied()
    }
}
