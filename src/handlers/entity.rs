//! Entity CRUD handlers: list, read, create, update, patch, delete.

use crate::error::AppError;
use crate::model::Record;
use crate::openapi::{EntityBody, RecordPage};
use crate::pagination::PageRequest;
use crate::response::{success_message, StatusMessage};
use crate::schema::EntitySchema;
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

fn resolve(state: &AppState, path_segment: &str) -> Result<&'static EntitySchema, AppError> {
    state
        .schemas
        .schema_by_name(path_segment)
        .map_err(|_| AppError::NotFound(format!("Unknown entity kind: {}", path_segment)))
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid id: {}", id_str)))
}

/// A JSON body, or `None` when the request carried nothing (empty or `null`).
fn optional_body(bytes: &Bytes) -> Result<Option<Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    let v: Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {}", e)))?;
    Ok((!v.is_null()).then_some(v))
}

fn object_body(bytes: &Bytes, missing: String) -> Result<Record, AppError> {
    match optional_body(bytes)? {
        Some(Value::Object(m)) => Ok(m),
        Some(_) => Err(AppError::BadRequest("body must be a JSON object".into())),
        None => Err(AppError::BadRequest(missing)),
    }
}

fn page_param(params: &HashMap<String, String>, key: &str) -> Result<u32, AppError> {
    params
        .get(key)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|n| *n >= 1)
        .ok_or_else(|| AppError::BadRequest(format!("{} must be an integer of 1 or more", key)))
}

#[utoipa::path(
    get,
    path = "/api/{kind}",
    params(
        ("kind" = String, Path, description = "customer, product, store or sale"),
        ("pageNumber" = u32, Query, description = "1-based page number"),
        ("pageSize" = u32, Query, description = "Rows per page"),
    ),
    responses(
        (status = 200, description = "One page ordered by id", body = RecordPage),
        (status = 400, description = "Bad paging parameters or storage fault", body = StatusMessage),
        (status = 404, description = "Unknown kind", body = StatusMessage),
    )
)]
pub async fn list(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let schema = resolve(&state, &path_segment)?;
    let page = PageRequest::new(page_param(&params, "pageNumber")?, page_param(&params, "pageSize")?);
    let paged = CrudService::list_page(&state.pool, schema, &state.db_schema, page).await?;
    Ok((StatusCode::OK, Json(paged)))
}

#[utoipa::path(
    get,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "customer, product, store or sale"),
        ("id" = i64, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "The record", body = EntityBody),
        (status = 404, description = "No such record", body = StatusMessage),
    )
)]
pub async fn read(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let schema = resolve(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, schema, &state.db_schema, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} with Id: {} not found", schema.kind, id)))?;
    Ok((StatusCode::OK, Json(row)))
}

#[utoipa::path(
    post,
    path = "/api/{kind}",
    params(("kind" = String, Path, description = "customer, product, store or sale")),
    request_body = EntityBody,
    responses(
        (status = 201, description = "Created; the id is assigned", body = EntityBody),
        (status = 400, description = "Missing or invalid body", body = StatusMessage),
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let schema = resolve(&state, &path_segment)?;
    let body = object_body(&body, format!("Give proper values for {}.", schema.kind))?;
    let row = CrudService::create(&state.pool, schema, &state.db_schema, &body).await?;
    tracing::info!(kind = %schema.kind, id = ?row.get("id"), "created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    put,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "customer, product, store or sale"),
        ("id" = i64, Path, description = "Record id"),
    ),
    request_body = EntityBody,
    responses(
        (status = 200, description = "Updated record", body = EntityBody),
        (status = 400, description = "Missing or invalid body", body = StatusMessage),
        (status = 404, description = "No such record", body = StatusMessage),
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let schema = resolve(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    let body = object_body(&body, format!("Provide some value for {}.", schema.kind))?;
    let row = CrudService::update(&state.pool, schema, &state.db_schema, id, &body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} with Id: {} not found", schema.kind, id)))?;
    Ok((StatusCode::OK, Json(row)))
}

#[utoipa::path(
    patch,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "store"),
        ("id" = i64, Path, description = "Record id"),
    ),
    request_body(content = EntityBody, content_type = "application/merge-patch+json"),
    responses(
        (status = 200, description = "Merged record", body = EntityBody),
        (status = 400, description = "Kind not patchable, record missing or patch absent", body = StatusMessage),
    )
)]
pub async fn patch(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let schema = resolve(&state, &path_segment)?;
    if !schema.patchable {
        return Err(AppError::BadRequest(format!("{} does not support PATCH.", schema.kind)));
    }
    let id = parse_id(&id_str)?;
    let patch = optional_body(&body)?
        .ok_or_else(|| AppError::BadRequest(format!("Provide some value for {}.", schema.kind)))?;
    let row = CrudService::patch(&state.pool, schema, &state.db_schema, id, &patch)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("{} with Id: {} not found", schema.kind, id)))?;
    Ok((StatusCode::OK, Json(row)))
}

#[utoipa::path(
    delete,
    path = "/api/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "customer, product, store or sale"),
        ("id" = i64, Path, description = "Record id"),
    ),
    responses(
        (status = 200, description = "Deleted", body = StatusMessage),
        (status = 400, description = "Referenced by a sale, or storage fault", body = StatusMessage),
        (status = 404, description = "No such record", body = StatusMessage),
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path((path_segment, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let schema = resolve(&state, &path_segment)?;
    let id = parse_id(&id_str)?;
    if !CrudService::delete(&state.pool, schema, &state.db_schema, id).await? {
        return Err(AppError::NotFound(format!("{} with Id: {} not found", schema.kind, id)));
    }
    tracing::info!(kind = %schema.kind, id, "deleted");
    Ok((
        StatusCode::OK,
        Json(success_message(format!("{} with Id: {} deleted successfully", schema.kind, id))),
    ))
}
