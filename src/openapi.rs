//! OpenAPI document for the CRUD surface, served at `/api/openapi.json`.

use crate::handlers::entity;
use crate::model::{Customer, Product, Sale, Store};
use crate::response::StatusMessage;
use axum::{routing::get, Json, Router};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Body of any one kind; which one is decided by the `{kind}` path segment.
#[derive(Serialize, ToSchema)]
#[serde(untagged)]
pub enum EntityBody {
    Customer(Customer),
    Product(Product),
    Store(Store),
    Sale(Sale),
}

/// One page of records.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordPage {
    pub dtos: Vec<EntityBody>,
    pub total_count: i64,
}

#[derive(OpenApi)]
#[openapi(
    paths(entity::list, entity::read, entity::create, entity::update, entity::patch, entity::delete),
    components(schemas(EntityBody, RecordPage, StatusMessage, Customer, Product, Store, Sale)),
    tags((name = "retail-admin", description = "Customers, products, stores and sales"))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// GET /openapi.json (mounted under `/api`).
pub fn openapi_routes() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}
