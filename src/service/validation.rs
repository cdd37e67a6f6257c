//! Request body validation against the entity schema.

use crate::error::{AppError, EngineError};
use crate::model::Record;
use crate::schema::{EntitySchema, FieldKind};
use crate::table::parse_datetime;
use crate::validation::validate_submit;
use serde_json::Value;

pub struct RequestValidator;

impl RequestValidator {
    /// Type-check every stored field, then apply the submit contract of the kind.
    /// Returns the body reduced to stored keys with dates normalized to ISO date-time.
    pub fn validate(schema: &EntitySchema, body: &Record) -> Result<Record, AppError> {
        let mut clean = Record::new();
        for f in schema.fields {
            match f.kind {
                FieldKind::Text => {
                    let s = body
                        .get(f.key)
                        .and_then(Value::as_str)
                        .ok_or_else(|| AppError::Validation(format!("{} is required", f.label)))?;
                    clean.insert(f.key.into(), Value::String(s.to_string()));
                }
                FieldKind::Number => {
                    let n = body
                        .get(f.key)
                        .and_then(Value::as_f64)
                        .filter(|n| n.is_finite() && *n >= 0.0)
                        .ok_or_else(|| AppError::Validation(format!("{} must be a number of zero or more", f.label)))?;
                    clean.insert(f.key.into(), Value::from(n));
                }
                FieldKind::Date => {
                    let d = body
                        .get(f.key)
                        .and_then(Value::as_str)
                        .and_then(parse_datetime)
                        .ok_or_else(|| AppError::Validation(format!("{} must be a valid date", f.label)))?;
                    clean.insert(
                        f.key.into(),
                        Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
                    );
                }
                FieldKind::Reference(target) => {
                    let id_key = f.id_key.unwrap_or(f.key);
                    let id = body
                        .get(id_key)
                        .and_then(Value::as_i64)
                        .filter(|id| *id >= 1)
                        .ok_or_else(|| AppError::Validation(format!("Select a valid {}", target)))?;
                    clean.insert(id_key.into(), Value::from(id));
                }
            }
        }
        validate_submit(schema.kind, &clean).map_err(|e| match e {
            EngineError::Validation { message, .. } => AppError::Validation(message),
            other => AppError::Validation(other.to_string()),
        })?;
        Ok(clean)
    }
}
