use serde_json::{Map, Value};

/// Flattens a nested body map into form-data fields.
///
/// Top-level scalars are kept as-is. Object fields expand each sub-key into
/// `parent[sub]`; array fields expand each index into `parent[idx]`. When an
/// expanded value is itself an object or array, the whole pass runs again on
/// the partially-flattened result, until no nested values remain.
pub fn convert_to_form_data(data: &Map<String, Value>) -> Map<String, Value> {
    let mut flattened = Map::new();
    let mut recursive = false;

    for (key, value) in data {
        match value {
            Value::Object(object) => {
                for (subkey, subvalue) in object {
                    if subvalue.is_object() || subvalue.is_array() {
                        recursive = true;
                    }
                    flattened.insert(format!("{}[{}]", key, subkey), subvalue.clone());
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    if item.is_object() || item.is_array() {
                        recursive = true;
                    }
                    flattened.insert(format!("{}[{}]", key, index), item.clone());
                }
            }
            scalar => {
                flattened.insert(key.clone(), scalar.clone());
            }
        }
    }

    if recursive {
        return convert_to_form_data(&flattened);
    }

    flattened
}

/// Form-field rendering of a flattened value. Strings go out verbatim,
/// everything else in its JSON notation.
pub fn form_value_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn scalars_pass_through_unchanged() {
        let data = as_map(json!({"a": 1, "b": "x", "c": true}));
        assert_eq!(convert_to_form_data(&data), data);
    }

    #[test]
    fn nested_objects_flatten_recursively() {
        let data = as_map(json!({"a": 1, "b": {"x": 2, "y": {"z": 3}}}));

        let flattened = convert_to_form_data(&data);

        assert_eq!(
            flattened,
            as_map(json!({"a": 1, "b[x]": 2, "b[y][z]": 3}))
        );
    }

    #[test]
    fn arrays_expand_by_index() {
        let data = as_map(json!({"docs": ["a", "b"], "extra": {"tags": [1, 2]}}));

        let flattened = convert_to_form_data(&data);

        assert_eq!(
            flattened,
            as_map(json!({
                "docs[0]": "a",
                "docs[1]": "b",
                "extra[tags][0]": 1,
                "extra[tags][1]": 2
            }))
        );
    }

    #[test]
    fn deep_nesting_terminates() {
        let data = as_map(json!({"a": {"b": {"c": {"d": {"e": 5}}}}}));

        let flattened = convert_to_form_data(&data);

        assert_eq!(flattened, as_map(json!({"a[b][c][d][e]": 5})));
    }

    #[test]
    fn form_values_render_without_json_quoting_for_strings() {
        assert_eq!(form_value_string(&json!("texto")), "texto");
        assert_eq!(form_value_string(&json!(12)), "12");
        assert_eq!(form_value_string(&json!(true)), "true");
        assert_eq!(form_value_string(&json!(null)), "null");
    }
}
