//! Shared application state for all routes.

use crate::schema::SchemaRegistry;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// PostgreSQL schema holding the entity tables.
    pub db_schema: Arc<str>,
    pub schemas: Arc<SchemaRegistry>,
}

impl AppState {
    pub fn new(pool: PgPool, db_schema: &str) -> Self {
        Self {
            pool,
            db_schema: Arc::from(db_schema),
            schemas: Arc::new(SchemaRegistry::builtin()),
        }
    }
}
