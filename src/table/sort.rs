//! Non-mutating, stable sort of a record collection by one field.

use crate::model::Record;
use crate::schema::{EntitySchema, FieldKind};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;
use std::cmp::Ordering;

/// Sorted copy of `records` by `key`. `None` when there is nothing to sort: empty input,
/// empty key, or a key no record carries. Callers keep their previous view on `None`.
pub fn sort_records(
    records: &[Record],
    key: &str,
    ascending: bool,
    schema: &EntitySchema,
) -> Option<Vec<Record>> {
    if records.is_empty() || key.is_empty() || !records.iter().any(|r| r.contains_key(key)) {
        tracing::debug!(kind = %schema.kind, key, "nothing to sort");
        return None;
    }
    let policy = schema.kind_of(key).unwrap_or_else(|| infer_kind(records, key));
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare(a.get(key), b.get(key), policy);
        if ascending {
            ord
        } else {
            ord.reverse()
        }
    });
    Some(sorted)
}

fn infer_kind(records: &[Record], key: &str) -> FieldKind {
    match records.iter().find_map(|r| r.get(key).filter(|v| !v.is_null())) {
        Some(Value::Number(_)) => FieldKind::Number,
        _ => FieldKind::Text,
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>, kind: FieldKind) -> Ordering {
    match kind {
        FieldKind::Number => cmp_option(as_number(a), as_number(b), f64::total_cmp),
        FieldKind::Date => as_datetime(a).cmp(&as_datetime(b)),
        FieldKind::Text | FieldKind::Reference(_) => locale_cmp(&as_text(a), &as_text(b)),
    }
}

fn cmp_option<T>(a: Option<T>, b: Option<T>, f: impl Fn(&T, &T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => f(&x, &y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn as_number(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(crate::model::date_only(s), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn as_datetime(v: Option<&Value>) -> Option<NaiveDateTime> {
    v.and_then(Value::as_str).and_then(parse_datetime)
}

fn as_text(v: Option<&Value>) -> String {
    match v {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Caseless comparison; on a caseless tie lowercase sorts before uppercase.
fn locale_cmp(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{schema_for, EntityKind};
    use serde_json::json;

    fn recs(v: Value) -> Vec<Record> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect()
    }

    fn ids(records: &[Record]) -> Vec<i64> {
        records.iter().map(|r| r["id"].as_i64().unwrap()).collect()
    }

    #[test]
    fn numeric_column_sorts_numerically() {
        let products = recs(json!([
            {"id": 1, "name": "A", "price": 10},
            {"id": 2, "name": "B", "price": 9.5},
            {"id": 3, "name": "C", "price": 100}
        ]));
        let schema = schema_for(EntityKind::Product);
        assert_eq!(ids(&sort_records(&products, "price", true, schema).unwrap()), [2, 1, 3]);
        assert_eq!(ids(&sort_records(&products, "price", false, schema).unwrap()), [3, 1, 2]);
    }

    #[test]
    fn date_column_sorts_chronologically() {
        let sales = recs(json!([
            {"id": 1, "dateSold": "2024-03-01T00:00:00"},
            {"id": 2, "dateSold": "2023-12-31T23:00:00"},
            {"id": 3, "dateSold": "2024-01-15"}
        ]));
        let sorted = sort_records(&sales, "dateSold", true, schema_for(EntityKind::Sale)).unwrap();
        assert_eq!(ids(&sorted), [2, 3, 1]);
    }

    #[test]
    fn text_is_caseless_and_stable() {
        let customers = recs(json!([
            {"id": 1, "name": "bob", "address": "x"},
            {"id": 2, "name": "Alice", "address": "x"},
            {"id": 3, "name": "alice", "address": "y"},
            {"id": 4, "name": "Carl", "address": "x"}
        ]));
        let schema = schema_for(EntityKind::Customer);
        let by_name = sort_records(&customers, "name", true, schema).unwrap();
        assert_eq!(ids(&by_name), [3, 2, 1, 4]);

        // equal keys keep their relative order in both directions
        let by_addr = sort_records(&customers, "address", true, schema).unwrap();
        assert_eq!(ids(&by_addr), [1, 2, 4, 3]);
        let by_addr_desc = sort_records(&customers, "address", false, schema).unwrap();
        assert_eq!(ids(&by_addr_desc), [3, 1, 2, 4]);
    }

    #[test]
    fn sorting_twice_is_idempotent_and_pure() {
        let customers = recs(json!([
            {"id": 2, "name": "Zed", "address": "a"},
            {"id": 1, "name": "Amy", "address": "b"}
        ]));
        let before = customers.clone();
        let schema = schema_for(EntityKind::Customer);
        let once = sort_records(&customers, "name", true, schema).unwrap();
        let twice = sort_records(&once, "name", true, schema).unwrap();
        assert_eq!(once, twice);
        assert_eq!(customers, before);
    }

    #[test]
    fn nothing_to_sort_is_none() {
        let schema = schema_for(EntityKind::Customer);
        assert!(sort_records(&[], "name", true, schema).is_none());
        let customers = recs(json!([{"id": 1, "name": "A", "address": "b"}]));
        assert!(sort_records(&customers, "", true, schema).is_none());
        assert!(sort_records(&customers, "missing", true, schema).is_none());
    }
}
