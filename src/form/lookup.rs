//! Option lists that back reference fields.

use crate::error::EngineError;
use crate::model::{record_id, Record};
use crate::schema::EntityKind;
use serde_json::Value;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupOption {
    pub id: i64,
    pub name: String,
}

/// Reference options per kind (Customer, Product, Store for a Sale draft).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Lookups {
    lists: HashMap<EntityKind, Vec<LookupOption>>,
}

impl Lookups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options from fetched records; records without an id or name are skipped.
    pub fn options_from_records(records: &[Record]) -> Vec<LookupOption> {
        records
            .iter()
            .filter_map(|r| {
                let id = record_id(r)?;
                let name = r.get("name").and_then(Value::as_str)?;
                Some(LookupOption { id, name: name.to_string() })
            })
            .collect()
    }

    pub fn insert(&mut self, kind: EntityKind, options: Vec<LookupOption>) {
        self.lists.insert(kind, options);
    }

    pub fn options(&self, kind: EntityKind) -> &[LookupOption] {
        self.lists.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find(&self, kind: EntityKind, id: i64) -> Option<&LookupOption> {
        self.options(kind).iter().find(|o| o.id == id)
    }

    /// Move the option with `id` to the front of its list. Fails when the list is empty
    /// or does not contain `id`.
    pub fn put_selected_first(&mut self, kind: EntityKind, id: i64) -> Result<(), EngineError> {
        let list = self
            .lists
            .get_mut(&kind)
            .filter(|l| !l.is_empty())
            .ok_or_else(|| EngineError::LookupUnavailable(format!("no {} options", kind)))?;
        let pos = list
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| EngineError::LookupUnavailable(format!("{} {} not found in the list", kind, id)))?;
        let selected = list.remove(pos);
        list.insert(0, selected);
        Ok(())
    }
}
