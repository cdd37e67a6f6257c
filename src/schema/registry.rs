//! Static per-kind schemas: form fields, display columns and required response keys.
//! Field and column order is declaration order and is never re-sorted.

use crate::error::EngineError;
use crate::model::{Record, ID_KEY};
use crate::schema::{EntityKind, FieldKind};
use serde_json::Value;
use std::collections::HashMap;

/// One editable field of a form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// For reference fields: the key holding the foreign id (e.g. "customerId").
    pub id_key: Option<&'static str>,
}

impl FieldSpec {
    const fn text(key: &'static str, label: &'static str) -> Self {
        FieldSpec { key, label, kind: FieldKind::Text, id_key: None }
    }

    const fn number(key: &'static str, label: &'static str) -> Self {
        FieldSpec { key, label, kind: FieldKind::Number, id_key: None }
    }

    const fn date(key: &'static str, label: &'static str) -> Self {
        FieldSpec { key, label, kind: FieldKind::Date, id_key: None }
    }

    const fn reference(key: &'static str, id_key: &'static str, label: &'static str, target: EntityKind) -> Self {
        FieldSpec { key, label, kind: FieldKind::Reference(target), id_key: Some(id_key) }
    }
}

/// Cell formatting applied by the table renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellFormat {
    Plain,
    /// Time component truncated.
    DateOnly,
    /// Prefixed with `$`.
    Currency,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColumnSpec {
    pub key: &'static str,
    pub label: &'static str,
    /// Comparison policy for sorting this column.
    pub kind: FieldKind,
    pub format: CellFormat,
}

impl ColumnSpec {
    const fn new(key: &'static str, label: &'static str, kind: FieldKind, format: CellFormat) -> Self {
        ColumnSpec { key, label, kind, format }
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Storage table name.
    pub table: &'static str,
    pub fields: &'static [FieldSpec],
    pub columns: &'static [ColumnSpec],
    /// Keys every record of this kind must carry in a list response.
    pub required_keys: &'static [&'static str],
    /// Whether the server accepts JSON merge-patch for this kind.
    pub patchable: bool,
}

impl EntitySchema {
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn column(&self, key: &str) -> Option<&'static ColumnSpec> {
        self.columns.iter().find(|c| c.key == key)
    }

    /// Field kind of any key the schema knows about, form or display.
    pub fn kind_of(&self, key: &str) -> Option<FieldKind> {
        if key == ID_KEY {
            return Some(FieldKind::Number);
        }
        self.column(key)
            .map(|c| c.kind)
            .or_else(|| self.field(key).map(|f| f.kind))
    }

    pub fn reference_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| matches!(f.kind, FieldKind::Reference(_)))
    }

    /// True when every record carries all required keys.
    pub fn has_required_keys(&self, records: &[Record]) -> bool {
        records
            .iter()
            .all(|r| self.required_keys.iter().all(|k| r.contains_key(*k)))
    }

    /// New, not yet persisted record with empty values for every field.
    pub fn default_record(&self) -> Record {
        let mut record = Record::new();
        record.insert(ID_KEY.into(), Value::from(0));
        for f in self.fields {
            match f.kind {
                FieldKind::Text | FieldKind::Date => {
                    record.insert(f.key.into(), Value::String(String::new()));
                }
                FieldKind::Number => {
                    record.insert(f.key.into(), Value::Null);
                }
                FieldKind::Reference(_) => {
                    if let Some(id_key) = f.id_key {
                        record.insert(id_key.into(), Value::from(0));
                    }
                    record.insert(f.key.into(), Value::String(String::new()));
                }
            }
        }
        record
    }
}

static CUSTOMER: EntitySchema = EntitySchema {
    kind: EntityKind::Customer,
    table: "customer",
    fields: &[FieldSpec::text("name", "Name"), FieldSpec::text("address", "Address")],
    columns: &[
        ColumnSpec::new("name", "Name", FieldKind::Text, CellFormat::Plain),
        ColumnSpec::new("address", "Address", FieldKind::Text, CellFormat::Plain),
    ],
    required_keys: &["id", "name", "address"],
    patchable: false,
};

static PRODUCT: EntitySchema = EntitySchema {
    kind: EntityKind::Product,
    table: "product",
    fields: &[FieldSpec::text("name", "Name"), FieldSpec::number("price", "Price")],
    columns: &[
        ColumnSpec::new("name", "Name", FieldKind::Text, CellFormat::Plain),
        ColumnSpec::new("price", "Price", FieldKind::Number, CellFormat::Currency),
    ],
    required_keys: &["id", "name", "price"],
    patchable: false,
};

static STORE: EntitySchema = EntitySchema {
    kind: EntityKind::Store,
    table: "store",
    fields: &[FieldSpec::text("name", "Name"), FieldSpec::text("address", "Address")],
    columns: &[
        ColumnSpec::new("name", "Name", FieldKind::Text, CellFormat::Plain),
        ColumnSpec::new("address", "Address", FieldKind::Text, CellFormat::Plain),
    ],
    required_keys: &["id", "name", "address"],
    patchable: true,
};

static SALE: EntitySchema = EntitySchema {
    kind: EntityKind::Sale,
    table: "sale",
    fields: &[
        FieldSpec::date("dateSold", "Date Sold"),
        FieldSpec::reference("customer", "customerId", "Customer", EntityKind::Customer),
        FieldSpec::reference("product", "productId", "Product", EntityKind::Product),
        FieldSpec::reference("store", "storeId", "Store", EntityKind::Store),
    ],
    columns: &[
        ColumnSpec::new("customer", "Customer", FieldKind::Text, CellFormat::Plain),
        ColumnSpec::new("product", "Product", FieldKind::Text, CellFormat::Plain),
        ColumnSpec::new("store", "Store", FieldKind::Text, CellFormat::Plain),
        ColumnSpec::new("dateSold", "Date Sold", FieldKind::Date, CellFormat::DateOnly),
    ],
    required_keys: &["id", "dateSold", "customerId", "customer", "productId", "product", "storeId", "store"],
    patchable: false,
};

/// Schema of a kind. Infallible: the kind set is closed.
pub fn schema_for(kind: EntityKind) -> &'static EntitySchema {
    match kind {
        EntityKind::Customer => &CUSTOMER,
        EntityKind::Product => &PRODUCT,
        EntityKind::Store => &STORE,
        EntityKind::Sale => &SALE,
    }
}

/// What the Add form needs: a default draft plus labels and field kinds in order.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateDescription {
    pub defaults: Record,
    pub labels: Vec<(&'static str, &'static str)>,
    pub field_kinds: Vec<FieldKind>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditDescription {
    pub labels: Vec<(&'static str, &'static str)>,
    pub field_kinds: Vec<FieldKind>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DisplayDescription {
    pub column_labels: Vec<(&'static str, &'static str)>,
}

/// Lookup table from kind to schema. Lookups of unregistered kinds fail with `SchemaNotFound`.
#[derive(Clone, Debug)]
pub struct SchemaRegistry {
    schemas: HashMap<EntityKind, &'static EntitySchema>,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// All four built-in schemas.
    pub fn builtin() -> Self {
        EntityKind::ALL
            .into_iter()
            .fold(Self::empty(), |reg, kind| reg.register(schema_for(kind)))
    }

    pub fn register(mut self, schema: &'static EntitySchema) -> Self {
        self.schemas.insert(schema.kind, schema);
        self
    }

    pub fn schema(&self, kind: EntityKind) -> Result<&'static EntitySchema, EngineError> {
        self.schemas.get(&kind).copied().ok_or_else(|| {
            tracing::warn!(kind = %kind, "schema not registered");
            EngineError::SchemaNotFound(kind.name().to_string())
        })
    }

    /// Schema by kind name; unknown names are reported as `SchemaNotFound`.
    pub fn schema_by_name(&self, name: &str) -> Result<&'static EntitySchema, EngineError> {
        match EntityKind::from_path_segment(name) {
            Some(kind) => self.schema(kind),
            None => {
                tracing::warn!(kind = name, "schema lookup for unknown kind");
                Err(EngineError::SchemaNotFound(name.to_string()))
            }
        }
    }

    /// Add-form contract for callers that build their own inputs: default draft, then
    /// labels and field kinds in declaration order. `render_form` yields the same fields.
    pub fn describe_for_create(&self, kind: EntityKind) -> Result<CreateDescription, EngineError> {
        let schema = self.schema(kind)?;
        Ok(CreateDescription {
            defaults: schema.default_record(),
            labels: schema.fields.iter().map(|f| (f.key, f.label)).collect(),
            field_kinds: schema.fields.iter().map(|f| f.kind).collect(),
        })
    }

    /// Edit-form contract: labels and field kinds in declaration order, no defaults.
    pub fn describe_for_edit(&self, kind: EntityKind) -> Result<EditDescription, EngineError> {
        let schema = self.schema(kind)?;
        Ok(EditDescription {
            labels: schema.fields.iter().map(|f| (f.key, f.label)).collect(),
            field_kinds: schema.fields.iter().map(|f| f.kind).collect(),
        })
    }

    /// Column contract for callers that lay out their own table. `render_table` uses the
    /// same columns, followed by the Edit and Delete action columns.
    pub fn describe_for_display(&self, kind: EntityKind) -> Result<DisplayDescription, EngineError> {
        let schema = self.schema(kind)?;
        Ok(DisplayDescription {
            column_labels: schema.columns.iter().map(|c| (c.key, c.label)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_description_keeps_declaration_order() {
        let reg = SchemaRegistry::builtin();
        let desc = reg.describe_for_create(EntityKind::Sale).unwrap();
        let keys: Vec<_> = desc.labels.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["dateSold", "customer", "product", "store"]);
        assert_eq!(desc.field_kinds[1], FieldKind::Reference(EntityKind::Customer));
        assert_eq!(desc.defaults["id"], Value::from(0));
        assert_eq!(desc.defaults["storeId"], Value::from(0));
        assert_eq!(desc.defaults["store"], Value::from(""));
    }

    #[test]
    fn display_columns_differ_from_form_order_for_sale() {
        let reg = SchemaRegistry::builtin();
        let desc = reg.describe_for_display(EntityKind::Sale).unwrap();
        let keys: Vec<_> = desc.column_labels.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, ["customer", "product", "store", "dateSold"]);
    }

    #[test]
    fn unregistered_kind_is_schema_not_found() {
        let reg = SchemaRegistry::empty().register(schema_for(EntityKind::Customer));
        assert!(reg.describe_for_edit(EntityKind::Customer).is_ok());
        assert_eq!(
            reg.describe_for_edit(EntityKind::Product).unwrap_err(),
            EngineError::SchemaNotFound("Product".into())
        );
        assert!(matches!(
            reg.schema_by_name("Invoice"),
            Err(EngineError::SchemaNotFound(_))
        ));
    }

    #[test]
    fn product_defaults_have_no_price() {
        let d = schema_for(EntityKind::Product).default_record();
        assert_eq!(d["price"], Value::Null);
        assert_eq!(d["name"], Value::from(""));
    }
}
