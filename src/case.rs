//! Case conversion between wire keys (camelCase) and storage columns (snake_case).

use serde_json::{Map, Value};

/// Convert a single identifier from snake_case to camelCase.
/// e.g. "customer_id" -> "customerId", "date_sold" -> "dateSold"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "storeId" -> "store_id"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert all keys of a JSON object from snake_case to camelCase.
/// Used for rows read from storage so the client receives camelCase keys.
pub fn object_keys_to_camel_case(obj: Map<String, Value>) -> Map<String, Value> {
    obj.into_iter().map(|(k, v)| (to_camel_case(&k), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifiers_round_trip() {
        for (snake, camel) in [("date_sold", "dateSold"), ("customer_id", "customerId"), ("name", "name")] {
            assert_eq!(to_camel_case(snake), camel);
            assert_eq!(to_snake_case(camel), snake);
        }
    }

    #[test]
    fn row_keys_become_camel_case() {
        let row = json!({"id": 1, "store_id": 4, "date_sold": "2024-01-01T00:00:00"});
        let out = object_keys_to_camel_case(row.as_object().cloned().unwrap_or_default());
        assert_eq!(out["storeId"], json!(4));
        assert_eq!(out["dateSold"], json!("2024-01-01T00:00:00"));
        assert!(!out.contains_key("store_id"));
    }
}
