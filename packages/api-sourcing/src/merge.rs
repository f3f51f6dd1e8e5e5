//! Recursive merge of JSON configuration trees.
//!
//! Used for the `fetch_options` body and `metadata` bags, where a
//! per-request override must combine with the instance-wide defaults
//! instead of replacing them wholesale.

use serde_json::Value;

/// Deep-merge `overlay` onto `base`.
///
/// Objects merge key-by-key, recursing into nested objects. On leaf
/// conflicts the overlay wins. Arrays and scalars are leaves: an overlay
/// array replaces the base array, it is not merged element-wise.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            let mut merged = base_map.clone();
            for (key, overlay_value) in overlay_map {
                let entry = match merged.get(key) {
                    Some(base_value) => deep_merge(base_value, overlay_value),
                    None => overlay_value.clone(),
                };
                merged.insert(key.clone(), entry);
            }
            Value::Object(merged)
        }
        // Null overlay means "not specified", keep the base.
        (base, Value::Null) => base.clone(),
        (_, overlay) => overlay.clone(),
    }
}

/// Deep-merge two optional JSON objects.
///
/// Returns `None` only when both sides are absent.
pub fn merge_optional(base: Option<&Value>, overlay: Option<&Value>) -> Option<Value> {
    match (base, overlay) {
        (Some(base), Some(overlay)) => Some(deep_merge(base, overlay)),
        (Some(base), None) => Some(base.clone()),
        (None, Some(overlay)) => Some(overlay.clone()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_leaf_wins() {
        let base = json!({"a": 1, "b": 2});
        let overlay = json!({"b": 3});
        assert_eq!(deep_merge(&base, &overlay), json!({"a": 1, "b": 3}));
    }

    #[test]
    fn nested_objects_combine() {
        let base = json!({"headers": {"accept": "json", "x-a": "1"}});
        let overlay = json!({"headers": {"x-a": "2", "x-b": "3"}});
        assert_eq!(
            deep_merge(&base, &overlay),
            json!({"headers": {"accept": "json", "x-a": "2", "x-b": "3"}})
        );
    }

    #[test]
    fn arrays_replace() {
        let base = json!({"tags": [1, 2, 3]});
        let overlay = json!({"tags": [4]});
        assert_eq!(deep_merge(&base, &overlay), json!({"tags": [4]}));
    }

    #[test]
    fn null_overlay_keeps_base() {
        let base = json!({"a": 1});
        let overlay = json!(null);
        assert_eq!(deep_merge(&base, &overlay), base);
    }

    #[test]
    fn merge_optional_handles_absence() {
        let a = json!({"a": 1});
        let b = json!({"b": 2});
        assert_eq!(
            merge_optional(Some(&a), Some(&b)),
            Some(json!({"a": 1, "b": 2}))
        );
        assert_eq!(merge_optional(Some(&a), None), Some(a.clone()));
        assert_eq!(merge_optional(None, Some(&b)), Some(b.clone()));
        assert_eq!(merge_optional(None, None), None);
    }
}
