//! Retail admin: schema-driven CRUD engine (forms, tables, pagination, orchestration)
//! for customers, products, stores and sales, plus the REST backend it talks to.

pub mod api;
pub mod case;
pub mod config;
pub mod error;
pub mod form;
pub mod handlers;
pub mod model;
pub mod openapi;
pub mod orchestrator;
pub mod pagination;
pub mod response;
pub mod routes;
pub mod schema;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;
pub mod table;
pub mod validation;

pub use api::{EntityApi, EntityRegistry, HttpEntityApi, Page};
pub use config::{ClientSettings, ServerSettings};
pub use error::{AppError, ConfigError, EngineError};
pub use model::{Customer, Entity, PagedDtos, Product, Record, Sale, Store};
pub use orchestrator::{MessageLevel, Orchestrator, TransientMessage, MESSAGE_TTL};
pub use routes::{app, common_routes, entity_routes};
pub use schema::{schema_for, EntityKind, EntitySchema, SchemaRegistry};
pub use service::CrudService;
pub use state::AppState;
pub use store::{ensure_database_exists, ensure_tables};
