//! Router assembly: common routes at the root, CRUD and OpenAPI under `/api`.

mod common;
mod entity;

pub use common::common_routes;
pub use entity::entity_routes;

use crate::openapi::openapi_routes;
use crate::state::AppState;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// The whole HTTP surface with a request body limit of `max_body_bytes`.
pub fn app(state: AppState, max_body_bytes: usize) -> Router {
    let api = entity_routes(state.clone()).merge(openapi_routes());
    Router::new()
        .merge(common_routes(state))
        .nest("/api", api)
        .layer(ServiceBuilder::new().layer(RequestBodyLimitLayer::new(max_body_bytes)))
}
