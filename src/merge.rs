//! # Override Merging
//!
//! Explicit `openapi:` configuration on a route is deep-merged over the
//! inferred path item. Objects merge key by key; any other value in the
//! override replaces the inferred value outright.

use serde_json::Value;

/// Merges `overrides` into `target` in overwrite mode.
///
/// # Examples
/// ```
/// use route_openapi::merge::merge_overwrite;
/// use serde_json::json;
///
/// let mut item = json!({"get": {"summary": "Inferred", "description": "Doc"}});
/// merge_overwrite(&mut item, &json!({"get": {"summary": "Explicit"}}));
/// assert_eq!(item, json!({"get": {"summary": "Explicit", "description": "Doc"}}));
/// ```
pub fn merge_overwrite(target: &mut Value, overrides: &Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => {
            for (key, value) in overrides {
                let nested = value.is_object() && target.get(key).is_some_and(Value::is_object);
                if let Some(existing) = target.get_mut(key).filter(|_| nested) {
                    merge_overwrite(existing, value);
                } else {
                    target.insert(key.clone(), value.clone());
                }
            }
        }
        (target, overrides) => *target = overrides.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_override_wins_for_scalar() {
        let mut target = json!({"get": {"summary": "Total: FunctionHandler"}});
        merge_overwrite(&mut target, &json!({"get": {"summary": "Add numbers"}}));
        assert_eq!(target, json!({"get": {"summary": "Add numbers"}}));
    }

    #[test]
    fn test_override_adds_new_methods_and_keeps_rest() {
        let mut target = json!({"get": {"summary": "S", "responses": {"200": {}}}});
        merge_overwrite(
            &mut target,
            &json!({"post": {"summary": "P"}, "get": {"tags": ["x"]}}),
        );
        assert_eq!(
            target,
            json!({
                "get": {"summary": "S", "responses": {"200": {}}, "tags": ["x"]},
                "post": {"summary": "P"}
            })
        );
    }

    #[test]
    fn test_arrays_are_replaced_not_concatenated() {
        let mut target = json!({"get": {"parameters": [{"name": "a"}, {"name": "b"}]}});
        merge_overwrite(&mut target, &json!({"get": {"parameters": []}}));
        assert_eq!(target, json!({"get": {"parameters": []}}));
    }

    #[test]
    fn test_non_object_override_replaces_object() {
        let mut target = json!({"get": {"summary": "S"}});
        merge_overwrite(&mut target, &json!({"get": null}));
        assert_eq!(target, json!({"get": null}));
    }
}
