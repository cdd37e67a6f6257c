//! Health, readiness and version routes at the root.

use crate::schema::EntityKind;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
}

/// Readiness report. `missing_tables` lists entity tables not found in the configured schema.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Readiness {
    status: &'static str,
    db_schema: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_tables: Vec<&'static str>,
}

async fn health() -> Json<Liveness> {
    Json(Liveness { status: "ok" })
}

/// Ready once the database answers and every entity table exists.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Readiness>) {
    let mut missing = Vec::new();
    for kind in EntityKind::ALL {
        let table = kind.path_segment();
        let found: Result<Option<String>, sqlx::Error> = sqlx::query_scalar("SELECT to_regclass($1)::text")
            .bind(format!("\"{}\".\"{}\"", state.db_schema, table))
            .fetch_one(&state.pool)
            .await;
        match found {
            Ok(Some(_)) => {}
            Ok(None) => missing.push(table),
            Err(e) => {
                tracing::warn!(error = %e, "readiness probe failed");
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(Readiness {
                        status: "unavailable",
                        db_schema: state.db_schema.to_string(),
                        missing_tables: Vec::new(),
                    }),
                );
            }
        }
    }
    let status = if missing.is_empty() {
        StatusCode::OK
    } else {
        tracing::warn!(tables = ?missing, "entity tables missing");
        StatusCode::SERVICE_UNAVAILABLE
    };
    let label = if missing.is_empty() { "ok" } else { "degraded" };
    (
        status,
        Json(Readiness {
            status: label,
            db_schema: state.db_schema.to_string(),
            missing_tables: missing,
        }),
    )
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "kinds": EntityKind::ALL.iter().map(|k| k.path_segment()).collect::<Vec<_>>(),
    }))
}

pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
