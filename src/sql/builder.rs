//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and DDL from an entity schema.

use crate::case::to_snake_case;
use crate::model::{Record, ID_KEY};
use crate::schema::{schema_for, EntityKind, EntitySchema, FieldKind};
use serde_json::Value;

const MAIN_ALIAS: &str = "main";

/// Quote identifier for PostgreSQL (safe: only from static schemas and settings).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(db_schema: &str, table: &str) -> String {
    format!("{}.{}", quoted(db_schema), quoted(table))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Push a parameter and return its placeholder with an explicit cast.
    fn push_param(&mut self, v: Value, pg_type: &str) -> String {
        self.params.push(v);
        format!("${}::{}", self.params.len(), pg_type)
    }
}

/// One stored column of an entity, derived from a form field.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageColumn {
    /// Key in the wire record (`customerId` for a reference field).
    pub wire_key: &'static str,
    pub name: String,
    pub pg_type: &'static str,
    pub references: Option<EntityKind>,
}

/// Stored columns of `schema`, excluding the primary key. Reference fields store only
/// the foreign id; their display name is derived when reading.
pub fn storage_columns(schema: &EntitySchema) -> Vec<StorageColumn> {
    schema
        .fields
        .iter()
        .map(|f| {
            let (wire_key, pg_type, references) = match (f.kind, f.id_key) {
                (FieldKind::Reference(target), Some(id_key)) => (id_key, "bigint", Some(target)),
                (FieldKind::Reference(target), None) => (f.key, "bigint", Some(target)),
                (FieldKind::Text, _) => (f.key, "text", None),
                (FieldKind::Number, _) => (f.key, "numeric", None),
                (FieldKind::Date, _) => (f.key, "timestamp", None),
            };
            StorageColumn {
                wire_key,
                name: to_snake_case(wire_key),
                pg_type,
                references,
            }
        })
        .collect()
}

/// SELECT list over alias `main`: id, stored columns (numeric as float8 so it decodes
/// as f64) and one scalar subquery per reference for the referenced record's name.
fn select_list(schema: &EntitySchema, db_schema: &str) -> String {
    let mut parts = vec![format!("{}.{} AS {}", MAIN_ALIAS, quoted(ID_KEY), quoted(ID_KEY))];
    for c in storage_columns(schema) {
        let q = quoted(&c.name);
        let expr = if c.pg_type == "numeric" {
            format!("{}.{}::float8", MAIN_ALIAS, q)
        } else {
            format!("{}.{}", MAIN_ALIAS, q)
        };
        parts.push(format!("{} AS {}", expr, q));
    }
    for f in schema.reference_fields() {
        let FieldKind::Reference(target) = f.kind else { continue };
        let id_col = to_snake_case(f.id_key.unwrap_or(f.key));
        let rel_table = qualified_table(db_schema, schema_for(target).table);
        parts.push(format!(
            "(SELECT r.{} FROM {} r WHERE r.{} = {}.{}) AS {}",
            quoted("name"),
            rel_table,
            quoted(ID_KEY),
            MAIN_ALIAS,
            quoted(&id_col),
            quoted(&to_snake_case(f.key))
        ));
    }
    parts.join(", ")
}

/// One page ordered by id.
pub fn select_page(schema: &EntitySchema, db_schema: &str, limit: u32, offset: u64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} {} ORDER BY {}.{} LIMIT {} OFFSET {}",
        select_list(schema, db_schema),
        qualified_table(db_schema, schema.table),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted(ID_KEY),
        limit,
        offset
    );
    q
}

pub fn count(schema: &EntitySchema, db_schema: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", qualified_table(db_schema, schema.table));
    q
}

/// SELECT by primary key.
pub fn select_by_id(schema: &EntitySchema, db_schema: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(Value::from(id), "bigint");
    q.sql = format!(
        "SELECT {} FROM {} {} WHERE {}.{} = {}",
        select_list(schema, db_schema),
        qualified_table(db_schema, schema.table),
        MAIN_ALIAS,
        MAIN_ALIAS,
        quoted(ID_KEY),
        ph
    );
    q
}

/// INSERT every stored column from the wire record; the id is always assigned by the
/// database. Returns the row in read shape.
pub fn insert(schema: &EntitySchema, db_schema: &str, body: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for c in storage_columns(schema) {
        let val = body.get(c.wire_key).cloned().unwrap_or(Value::Null);
        placeholders.push(q.push_param(val, c.pg_type));
        cols.push(quoted(&c.name));
    }
    q.sql = format!(
        "WITH {} AS (INSERT INTO {} ({}) VALUES ({}) RETURNING *) SELECT {} FROM {}",
        MAIN_ALIAS,
        qualified_table(db_schema, schema.table),
        cols.join(", "),
        placeholders.join(", "),
        select_list(schema, db_schema),
        MAIN_ALIAS
    );
    q
}

/// UPDATE by id: SET every stored column present in the body. With nothing to set this
/// degrades to a SELECT by id.
pub fn update(schema: &EntitySchema, db_schema: &str, id: i64, body: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in storage_columns(schema) {
        let Some(v) = body.get(c.wire_key) else { continue };
        let rhs = q.push_param(v.clone(), c.pg_type);
        sets.push(format!("{} = {}", quoted(&c.name), rhs));
    }
    if sets.is_empty() {
        return select_by_id(schema, db_schema, id);
    }
    let id_ph = q.push_param(Value::from(id), "bigint");
    q.sql = format!(
        "WITH {} AS (UPDATE {} SET {} WHERE {} = {} RETURNING *) SELECT {} FROM {}",
        MAIN_ALIAS,
        qualified_table(db_schema, schema.table),
        sets.join(", "),
        quoted(ID_KEY),
        id_ph,
        select_list(schema, db_schema),
        MAIN_ALIAS
    );
    q
}

/// DELETE by id, returning the id when a row was removed.
pub fn delete(schema: &EntitySchema, db_schema: &str, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let ph = q.push_param(Value::from(id), "bigint");
    q.sql = format!(
        "DELETE FROM {} WHERE {} = {} RETURNING {}",
        qualified_table(db_schema, schema.table),
        quoted(ID_KEY),
        ph,
        quoted(ID_KEY)
    );
    q
}

/// CREATE TABLE IF NOT EXISTS for one kind. References are `ON DELETE RESTRICT`, so the
/// referenced kinds must be created first.
pub fn create_table(schema: &EntitySchema, db_schema: &str) -> String {
    let mut cols = vec![format!("{} BIGSERIAL PRIMARY KEY", quoted(ID_KEY))];
    for c in storage_columns(schema) {
        let ty = match c.pg_type {
            "numeric" => "NUMERIC(12, 2)",
            "timestamp" => "TIMESTAMP",
            "bigint" => "BIGINT",
            _ => "TEXT",
        };
        let mut def = format!("{} {} NOT NULL", quoted(&c.name), ty);
        if let Some(target) = c.references {
            def.push_str(&format!(
                " REFERENCES {} ({}) ON DELETE RESTRICT",
                qualified_table(db_schema, schema_for(target).table),
                quoted(ID_KEY)
            ));
        }
        cols.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
        qualified_table(db_schema, schema.table),
        cols.join(",\n    ")
    )
}
