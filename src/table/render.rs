//! Table view model: one sortable column per schema column, two trailing action columns.

use crate::model::{date_only, record_id, Record};
use crate::schema::{CellFormat, ColumnSpec, EntityKind, EntitySchema};
use serde_json::{Number, Value};

pub const NO_DATA_MESSAGE: &str = "No data available. Please try again in sometime.";
pub const INVALID_RESPONSE_MESSAGE: &str = "Invalid response from server. Please try again in sometime.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::Edit => "EDIT",
            RowAction::Delete => "DELETE",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HeaderCell {
    /// Data column with ascending/descending sort controls.
    Sortable { key: &'static str, label: &'static str },
    Action(RowAction),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub id: i64,
    pub cells: Vec<String>,
    pub actions: [RowAction; 2],
}

#[derive(Clone, Debug, PartialEq)]
pub enum TableBody {
    Rows(Vec<TableRow>),
    /// A single row spanning every column.
    Placeholder { colspan: usize, message: &'static str },
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableView {
    pub kind: EntityKind,
    pub headers: Vec<HeaderCell>,
    pub body: TableBody,
}

impl TableView {
    pub fn rows(&self) -> &[TableRow] {
        match &self.body {
            TableBody::Rows(rows) => rows,
            TableBody::Placeholder { .. } => &[],
        }
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        match self.body {
            TableBody::Placeholder { message, .. } => Some(message),
            TableBody::Rows(_) => None,
        }
    }
}

/// Render `records` in schema column order. Any record missing a required key turns the
/// whole body into a placeholder; no partial rows are produced.
pub fn render_table(schema: &EntitySchema, records: &[Record]) -> TableView {
    let mut headers: Vec<HeaderCell> = schema
        .columns
        .iter()
        .map(|c| HeaderCell::Sortable { key: c.key, label: c.label })
        .collect();
    headers.push(HeaderCell::Action(RowAction::Edit));
    headers.push(HeaderCell::Action(RowAction::Delete));
    let colspan = headers.len();

    let body = if records.is_empty() {
        TableBody::Placeholder { colspan, message: NO_DATA_MESSAGE }
    } else if !schema.has_required_keys(records) {
        tracing::warn!(kind = %schema.kind, "records lack required fields; check the api response");
        TableBody::Placeholder { colspan, message: INVALID_RESPONSE_MESSAGE }
    } else {
        TableBody::Rows(records.iter().map(|r| render_row(schema.columns, r)).collect())
    };

    TableView { kind: schema.kind, headers, body }
}

fn render_row(columns: &[ColumnSpec], record: &Record) -> TableRow {
    TableRow {
        id: record_id(record).unwrap_or_default(),
        cells: columns.iter().map(|c| format_cell(c, record.get(c.key))).collect(),
        actions: [RowAction::Edit, RowAction::Delete],
    }
}

pub fn format_cell(column: &ColumnSpec, value: Option<&Value>) -> String {
    let plain = display_value(value);
    match column.format {
        CellFormat::Plain => plain,
        CellFormat::DateOnly => date_only(&plain).to_string(),
        CellFormat::Currency => format!("${}", plain),
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => format_number(n),
        Some(other) => other.to_string(),
    }
}

/// Integral values print without a fraction ("10"), others as-is ("9.99").
pub fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
        Some(f) => format!("{}", f),
        None => n.to_string(),
    }
}
