//! Form view model: one input control per schema field, chosen by field kind.

use crate::form::{FieldError, LookupOption, Modal, ModalPhase, ModalRole};
use crate::model::{date_only, Record};
use crate::schema::{EntityKind, FieldKind, FieldSpec};
use crate::table::format_number;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum Control {
    Text {
        key: &'static str,
        label: &'static str,
        value: String,
        placeholder: String,
    },
    /// Non-negative numeric input.
    Number {
        key: &'static str,
        label: &'static str,
        value: String,
        min: f64,
    },
    /// Date-only input; value is `YYYY-MM-DD` or empty.
    Date {
        key: &'static str,
        label: &'static str,
        value: String,
    },
    /// Selection over a lookup list. Disabled until the list is loaded.
    Reference {
        key: &'static str,
        id_key: &'static str,
        label: &'static str,
        target: EntityKind,
        options: Vec<LookupOption>,
        selected: Option<i64>,
        enabled: bool,
    },
}

impl Control {
    pub fn key(&self) -> &'static str {
        match self {
            Control::Text { key, .. }
            | Control::Number { key, .. }
            | Control::Date { key, .. }
            | Control::Reference { key, .. } => *key,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FormView {
    pub kind: EntityKind,
    pub role: ModalRole,
    pub phase: ModalPhase,
    pub title: String,
    /// Empty for a Delete confirmation.
    pub controls: Vec<Control>,
    pub prompt: Option<&'static str>,
    pub submit_label: &'static str,
    pub error: Option<FieldError>,
}

/// Render the open dialog. Delete renders a confirmation with no controls.
pub fn render_form(modal: &Modal) -> FormView {
    let kind = modal.kind();
    let (title, submit_label) = match modal.role() {
        ModalRole::Add => (format!("Create {}", kind), "create"),
        ModalRole::Edit => (format!("Edit {}", kind), "save"),
        ModalRole::Delete => (format!("Delete {}", kind), "delete"),
    };
    let (controls, prompt) = match modal.role() {
        ModalRole::Delete => (Vec::new(), Some("Are you sure?")),
        ModalRole::Add | ModalRole::Edit => (
            modal
                .schema()
                .fields
                .iter()
                .map(|f| render_control(f, modal))
                .collect(),
            None,
        ),
    };
    FormView {
        kind,
        role: modal.role(),
        phase: modal.phase(),
        title,
        controls,
        prompt,
        submit_label,
        error: modal.error().cloned(),
    }
}

fn render_control(field: &FieldSpec, modal: &Modal) -> Control {
    let record = modal.record();
    match field.kind {
        FieldKind::Text => Control::Text {
            key: field.key,
            label: field.label,
            value: text(record, field.key),
            placeholder: format!("Enter {}", field.label),
        },
        FieldKind::Number => Control::Number {
            key: field.key,
            label: field.label,
            value: text(record, field.key),
            min: 0.0,
        },
        FieldKind::Date => Control::Date {
            key: field.key,
            label: field.label,
            value: date_only(&text(record, field.key)).to_string(),
        },
        FieldKind::Reference(target) => {
            let id_key = field.id_key.unwrap_or(field.key);
            let selected = record.get(id_key).and_then(Value::as_i64).filter(|id| *id > 0);
            let (options, enabled) = match modal.lookups() {
                Some(l) => (l.options(target).to_vec(), true),
                None => (Vec::new(), false),
            };
            Control::Reference {
                key: field.key,
                id_key,
                label: field.label,
                target,
                options,
                selected,
                enabled,
            }
        }
    }
}

fn text(record: &Record, key: &str) -> String {
    match record.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => format_number(n),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Lookups;
    use crate::schema::schema_for;
    use serde_json::json;

    #[test]
    fn add_form_has_one_control_per_field() {
        let modal = Modal::add(schema_for(EntityKind::Product));
        let view = render_form(&modal);
        assert_eq!(view.title, "Create Product");
        let keys: Vec<_> = view.controls.iter().map(Control::key).collect();
        assert_eq!(keys, ["name", "price"]);
        assert!(matches!(view.controls[1], Control::Number { min, .. } if min == 0.0));
    }

    #[test]
    fn controls_follow_the_create_description() {
        let desc = crate::schema::SchemaRegistry::builtin()
            .describe_for_create(EntityKind::Sale)
            .unwrap();
        let view = render_form(&Modal::add(schema_for(EntityKind::Sale)));
        let labels: Vec<_> = view
            .controls
            .iter()
            .map(|c| match c {
                Control::Text { key, label, .. }
                | Control::Number { key, label, .. }
                | Control::Date { key, label, .. }
                | Control::Reference { key, label, .. } => (*key, *label),
            })
            .collect();
        assert_eq!(labels, desc.labels);
    }

    #[test]
    fn sale_references_disabled_until_lookups_arrive() {
        let mut modal = Modal::add(schema_for(EntityKind::Sale));
        let view = render_form(&modal);
        assert!(matches!(view.controls[0], Control::Date { .. }));
        assert!(matches!(view.controls[1], Control::Reference { enabled: false, .. }));

        let mut l = Lookups::new();
        l.insert(EntityKind::Customer, vec![LookupOption { id: 1, name: "Ann".into() }]);
        modal.attach_lookups(l);
        let view = render_form(&modal);
        match &view.controls[1] {
            Control::Reference { enabled, options, selected, id_key, .. } => {
                assert!(*enabled);
                assert_eq!(options.len(), 1);
                assert_eq!(*selected, None);
                assert_eq!(*id_key, "customerId");
            }
            other => panic!("unexpected control {:?}", other),
        }
    }

    #[test]
    fn delete_is_a_confirmation() {
        let target = json!({"id": 3, "name": "Ann", "address": "1 Road"});
        let modal = Modal::delete(schema_for(EntityKind::Customer), target.as_object().unwrap());
        let view = render_form(&modal);
        assert!(view.controls.is_empty());
        assert_eq!(view.prompt, Some("Are you sure?"));
        assert_eq!(view.submit_label, "delete");
    }
}
