//! Add/Edit/Delete dialog state machine.
//!
//! `Draft -> Submitting -> Closed`, or `Draft -> Closed` on cancel. A client-side
//! validation failure keeps the dialog in `Draft` with a field error. Once `Closed`
//! the draft is gone and the instance accepts no further transitions.

use crate::error::EngineError;
use crate::form::Lookups;
use crate::model::{date_only, record_id, Record};
use crate::schema::{EntityKind, EntitySchema, FieldKind};
use crate::validation::{require_all_present, validate_submit};
use chrono::NaiveDate;
use serde_json::{Number, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalRole {
    Add,
    Edit,
    Delete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModalPhase {
    Draft,
    Submitting,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Clone, Debug)]
pub struct Modal {
    schema: &'static EntitySchema,
    role: ModalRole,
    phase: ModalPhase,
    /// Draft for Add/Edit, read-only target for Delete.
    record: Record,
    error: Option<FieldError>,
    lookups: Option<Lookups>,
}

impl Modal {
    /// Add dialog seeded with the schema's default record.
    pub fn add(schema: &'static EntitySchema) -> Self {
        Self::new(schema, ModalRole::Add, schema.default_record())
    }

    /// Edit dialog over a deep copy of `record`. Date fields keep only their date portion.
    pub fn edit(schema: &'static EntitySchema, record: &Record) -> Self {
        let mut draft = record.clone();
        for f in schema.fields.iter().filter(|f| f.kind == FieldKind::Date) {
            if let Some(Value::String(s)) = draft.get(f.key) {
                let d = date_only(s).to_string();
                draft.insert(f.key.into(), Value::String(d));
            }
        }
        Self::new(schema, ModalRole::Edit, draft)
    }

    pub fn delete(schema: &'static EntitySchema, target: &Record) -> Self {
        Self::new(schema, ModalRole::Delete, target.clone())
    }

    fn new(schema: &'static EntitySchema, role: ModalRole, record: Record) -> Self {
        Self {
            schema,
            role,
            phase: ModalPhase::Draft,
            record,
            error: None,
            lookups: None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.schema.kind
    }

    pub fn schema(&self) -> &'static EntitySchema {
        self.schema
    }

    pub fn role(&self) -> ModalRole {
        self.role
    }

    pub fn phase(&self) -> ModalPhase {
        self.phase
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn record_id(&self) -> Option<i64> {
        record_id(&self.record)
    }

    pub fn error(&self) -> Option<&FieldError> {
        self.error.as_ref()
    }

    pub fn lookups(&self) -> Option<&Lookups> {
        self.lookups.as_ref()
    }

    /// Reference fields become interactive once lookups are attached.
    pub fn attach_lookups(&mut self, lookups: Lookups) {
        self.lookups = Some(lookups);
    }

    fn ensure_draft(&self) -> Result<(), EngineError> {
        if self.phase == ModalPhase::Draft {
            Ok(())
        } else {
            Err(EngineError::NoActiveModal(self.kind()))
        }
    }

    /// Commit one input change to the draft. Reference fields go through `select_reference`.
    pub fn set_field(&mut self, key: &str, raw: &str) -> Result<(), EngineError> {
        self.ensure_draft()?;
        if self.role == ModalRole::Delete
            || !require_all_present(&[("name", &Value::from(key)), ("value", &Value::from(raw.trim()))])
        {
            return Err(EngineError::validation(key, "Missing value in form. Please try again."));
        }
        let field = self
            .schema
            .field(key)
            .ok_or_else(|| EngineError::validation(key, format!("{} has no field {}", self.kind(), key)))?;
        let value = match field.kind {
            FieldKind::Text => Value::String(raw.to_string()),
            FieldKind::Number => parse_non_negative(key, raw)?,
            FieldKind::Date => parse_date(key, raw)?,
            FieldKind::Reference(_) => {
                return Err(EngineError::validation(key, "Please select a valid option"));
            }
        };
        self.record.insert(key.to_string(), value);
        if self.error.as_ref().is_some_and(|e| e.field == key) {
            self.error = None;
        }
        Ok(())
    }

    /// Select option `id` for reference field `key`, setting the id and the display name together.
    pub fn select_reference(&mut self, key: &str, id: i64) -> Result<(), EngineError> {
        self.ensure_draft()?;
        let field = self
            .schema
            .field(key)
            .ok_or_else(|| EngineError::validation(key, "Please select a valid option"))?;
        let (FieldKind::Reference(target), Some(id_key)) = (field.kind, field.id_key) else {
            return Err(EngineError::validation(key, "Please select a valid option"));
        };
        let lookups = self
            .lookups
            .as_ref()
            .ok_or_else(|| EngineError::LookupUnavailable(format!("{} options not loaded", target)))?;
        let option = lookups
            .find(target, id)
            .ok_or_else(|| EngineError::validation(key, "Please select a valid option"))?;
        let id_value = Value::from(option.id);
        let name_value = Value::String(option.name.clone());
        if !require_all_present(&[
            ("id", &id_value),
            ("name", &name_value),
            ("kind", &Value::from(target.name())),
        ]) {
            return Err(EngineError::validation(key, "Missing value in form. Please try again."));
        }
        self.record.insert(id_key.to_string(), id_value);
        self.record.insert(key.to_string(), name_value);
        if self.error.as_ref().is_some_and(|e| e.field == key) {
            self.error = None;
        }
        Ok(())
    }

    /// Validate the draft and move to `Submitting`, returning the body to send.
    /// On validation failure the dialog stays in `Draft` with the field error recorded.
    pub fn begin_submit(&mut self) -> Result<Record, EngineError> {
        self.ensure_draft()?;
        if self.role != ModalRole::Delete {
            if let Err(e) = self.check_draft() {
                if let EngineError::Validation { field, message } = &e {
                    self.error = Some(FieldError {
                        field: field.clone(),
                        message: message.clone(),
                    });
                }
                return Err(e);
            }
        }
        self.error = None;
        self.phase = ModalPhase::Submitting;
        Ok(self.record.clone())
    }

    fn check_draft(&self) -> Result<(), EngineError> {
        for f in self.schema.reference_fields() {
            let id = f.id_key.and_then(|k| self.record.get(k)).unwrap_or(&Value::Null);
            let name = self.record.get(f.key).unwrap_or(&Value::Null);
            if !require_all_present(&[("id", id), ("name", name)]) {
                return Err(EngineError::validation(f.key, format!("Please select a {}.", f.label)));
            }
        }
        for f in self.schema.fields.iter().filter(|f| f.kind == FieldKind::Date) {
            let v = self.record.get(f.key).unwrap_or(&Value::Null);
            if !require_all_present(&[(f.key, v)]) {
                return Err(EngineError::validation(f.key, format!("Please enter {}.", f.label)));
            }
        }
        validate_submit(self.kind(), &self.record)
    }

    /// Terminal transition; the draft is discarded.
    pub fn close(&mut self) {
        self.phase = ModalPhase::Closed;
        self.record.clear();
        self.error = None;
        self.lookups = None;
    }
}

fn parse_non_negative(key: &str, raw: &str) -> Result<Value, EngineError> {
    let n: f64 = raw
        .trim()
        .parse()
        .map_err(|_| EngineError::validation(key, "Please enter a number."))?;
    if !n.is_finite() || n < 0.0 {
        return Err(EngineError::validation(key, "Please enter a number of zero or more."));
    }
    Number::from_f64(n)
        .map(Value::Number)
        .ok_or_else(|| EngineError::validation(key, "Please enter a number."))
}

fn parse_date(key: &str, raw: &str) -> Result<Value, EngineError> {
    let d = NaiveDate::parse_from_str(date_only(raw.trim()), "%Y-%m-%d")
        .map_err(|_| EngineError::validation(key, "Please enter a valid date."))?;
    Ok(Value::String(d.format("%Y-%m-%d").to_string()))
}
