//! Field validators and the per-kind submit contract. Validation runs on the in-memory draft.

use crate::error::EngineError;
use crate::model::Record;
use crate::schema::EntityKind;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

static NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z]+([ -][A-Za-z]+)*$").expect("name pattern"));

static ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]+((([,.\-]\s)|[,.\-]|\s)[A-Za-z0-9]+)*$").expect("address pattern")
});

static PRODUCT_OR_STORE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9]+((([.\-]\s)|[.\-]|\s)[A-Za-z0-9]+)*$").expect("product/store name pattern")
});

pub const NAME_MESSAGE: &str =
    "Please enter a valid name (letters, spaces, hyphens only, no leading or trailing spaces).";
pub const ADDRESS_MESSAGE: &str = "Please enter a valid address (alphanumeric then space, comma, dot, hyphens with more alpha numeric, no leading or trailing spaces).";
pub const PRODUCT_OR_STORE_NAME_MESSAGE: &str =
    "Please enter a valid name (alphanumeric, spaces, dot, hyphens only, no leading or trailing spaces).";
pub const PRICE_MESSAGE: &str = "Please enter a valid price (a number of zero or more).";

/// Letters separated by single interior spaces or hyphens.
pub fn is_valid_name(s: &str) -> bool {
    s.trim() == s && NAME.is_match(s)
}

/// Alphanumeric tokens joined by a comma, hyphen, dot or space (a punctuation mark may be followed by one space).
pub fn is_valid_address(s: &str) -> bool {
    s.trim() == s && ADDRESS.is_match(s)
}

/// Alphanumeric tokens joined by a hyphen, dot or space.
pub fn is_valid_product_or_store_name(s: &str) -> bool {
    s.trim() == s && PRODUCT_OR_STORE_NAME.is_match(s)
}

/// JavaScript-style truthiness: null, false, 0, NaN and "" are empty.
pub fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// False if any value is empty. Guards every field and selection mutation.
pub fn require_all_present(fields: &[(&str, &Value)]) -> bool {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, v)| !is_present(v))
        .map(|(k, _)| *k)
        .collect();
    if !missing.is_empty() {
        tracing::debug!(?missing, "missing required parameter(s)");
        return false;
    }
    true
}

fn text<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).and_then(Value::as_str).unwrap_or("")
}

fn check(ok: bool, field: &str, message: &str) -> Result<(), EngineError> {
    if ok {
        Ok(())
    } else {
        Err(EngineError::validation(field, message))
    }
}

/// Submit-time contract. The first failing field is reported; Sale has no pattern checks.
pub fn validate_submit(kind: EntityKind, record: &Record) -> Result<(), EngineError> {
    match kind {
        EntityKind::Customer => {
            check(is_valid_name(text(record, "name")), "name", NAME_MESSAGE)?;
            check(is_valid_address(text(record, "address")), "address", ADDRESS_MESSAGE)
        }
        EntityKind::Product => {
            check(
                is_valid_product_or_store_name(text(record, "name")),
                "name",
                PRODUCT_OR_STORE_NAME_MESSAGE,
            )?;
            let price_ok = record
                .get("price")
                .and_then(Value::as_f64)
                .map(|p| p >= 0.0 && p.is_finite())
                .unwrap_or(false);
            check(price_ok, "price", PRICE_MESSAGE)
        }
        EntityKind::Store => {
            check(
                is_valid_product_or_store_name(text(record, "name")),
                "name",
                PRODUCT_OR_STORE_NAME_MESSAGE,
            )?;
            check(is_valid_address(text(record, "address")), "address", ADDRESS_MESSAGE)
        }
        EntityKind::Sale => Ok(()),
    }
}
