//! Response bodies of the CRUD surface.

use serde::Serialize;
use utoipa::ToSchema;

/// `{status, message}` confirmation body, also the shape of every error.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusMessage {
    #[schema(value_type = String, example = "Success")]
    pub status: &'static str,
    pub message: String,
}

pub fn success_message(message: impl Into<String>) -> StatusMessage {
    StatusMessage {
        status: "Success",
        message: message.into(),
    }
}

pub fn error_message(message: impl Into<String>) -> StatusMessage {
    StatusMessage {
        status: "Error",
        message: message.into(),
    }
}
