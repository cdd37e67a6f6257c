//! Typed errors: engine-side taxonomy and HTTP mapping for the server surface.

use crate::response::error_message;
use crate::schema::EntityKind;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::time::Duration;
use thiserror::Error;

/// Failures raised by the client-side engine (schema lookup, validation, orchestration).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Client-side validation; blocks submission and names the offending field.
    #[error("{message}")]
    Validation { field: String, message: String },
    #[error("lookup data unavailable: {0}")]
    LookupUnavailable(String),
    /// Any failed call to the storage API. `message` is the server-supplied text, if any.
    #[error("request failed: {}", .message.as_deref().unwrap_or("no message from server"))]
    Request {
        status: Option<u16>,
        message: Option<String>,
    },
    #[error("request timed out after {0:?}")]
    RequestTimedOut(Duration),
    #[error("unknown entity kind: {0}")]
    UnknownEntityKind(String),
    #[error("schema not found: {0}")]
    SchemaNotFound(String),
    #[error("sort unavailable: {0}")]
    SortUnavailable(String),
    #[error("another {0} dialog is already open")]
    ModalBusy(EntityKind),
    #[error("no open {0} dialog")]
    NoActiveModal(EntityKind),
}

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn request(status: Option<u16>, message: Option<String>) -> Self {
        Self::Request { status, message }
    }

    /// Server-supplied message carried by a request failure.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Request { message, .. } => message.as_deref().filter(|m| !m.is_empty()),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Errors surfaced by the HTTP handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("An error occurred: {0}")]
    Db(#[from] sqlx::Error),
    /// Deletion blocked by a referencing row.
    #[error("{0}")]
    Constraint(String),
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) | AppError::Db(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            AppError::Validation(_) | AppError::Db(_) | AppError::Constraint(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
        };
        if let AppError::Db(e) = &self {
            tracing::warn!(error = %e, "database error");
        }
        (status, Json(error_message(self.to_string()))).into_response()
    }
}
