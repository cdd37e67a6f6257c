//! JSON merge patch (RFC 7386).

use serde_json::Value;

/// Apply `patch` to `target` in place: objects merge recursively, `null` removes a key,
/// anything else replaces the target wholesale.
pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(target_map) = target {
        for (k, v) in patch_map {
            if v.is_null() {
                target_map.remove(k);
            } else {
                merge_patch(target_map.entry(k.clone()).or_insert(Value::Null), v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_and_removes() {
        let mut doc = json!({"id": 7, "name": "Central", "address": "1 Main St"});
        merge_patch(&mut doc, &json!({"name": "North", "address": null}));
        assert_eq!(doc, json!({"id": 7, "name": "North"}));
    }

    #[test]
    fn nested_objects_merge() {
        let mut doc = json!({"a": {"b": 1, "c": 2}});
        merge_patch(&mut doc, &json!({"a": {"c": null, "d": 3}}));
        assert_eq!(doc, json!({"a": {"b": 1, "d": 3}}));
    }

    #[test]
    fn non_object_patch_replaces() {
        let mut doc = json!({"a": 1});
        merge_patch(&mut doc, &json!([1, 2]));
        assert_eq!(doc, json!([1, 2]));
    }
}
