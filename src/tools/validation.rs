//! Validate tool call arguments against a JSON Schema before execution.

use serde_json::Value;

/// Check `args` against the top level of `schema`.
///
/// Covers the object type check, required field presence and declared
/// property types. Returns a message describing the first violation.
pub fn validate_arguments(args: &Value, schema: &Value) -> Result<(), String> {
    let expects_object = schema.get("type").and_then(Value::as_str) == Some("object");
    let Some(obj) = args.as_object() else {
        if expects_object {
            return Err(format!("expected object arguments, got {}", type_name(args)));
        }
        return Ok(());
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str);
    if let Some(missing) = required.into_iter().find(|name| !obj.contains_key(*name)) {
        return Err(format!("missing required field '{missing}'"));
    }

    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(());
    };
    for (key, value) in obj {
        let expected = properties
            .get(key)
            .and_then(|p| p.get("type"))
            .and_then(Value::as_str);
        if let Some(expected) = expected {
            if !matches_type(value, expected) {
                return Err(format!(
                    "field '{key}' expected type '{expected}', got {}",
                    type_name(value)
                ));
            }
        }
    }

    Ok(())
}

fn matches_type(value: &Value, expected: &str) -> bool {
    match expected {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "max_results": { "type": "integer" },
            },
            "required": ["query"],
        })
    }

    #[test]
    fn accepts_well_formed_search_arguments() {
        assert!(validate_arguments(&json!({ "query": "rust" }), &search_schema()).is_ok());
        assert!(
            validate_arguments(&json!({ "query": "rust", "max_results": 2 }), &search_schema())
                .is_ok()
        );
    }

    #[test]
    fn rejects_non_object_arguments() {
        let err = validate_arguments(&json!("rust"), &search_schema()).unwrap_err();
        assert!(err.contains("expected object"));
    }

    #[test]
    fn rejects_missing_query() {
        let err = validate_arguments(&json!({}), &search_schema()).unwrap_err();
        assert_eq!(err, "missing required field 'query'");
    }

    #[test]
    fn rejects_wrongly_typed_field() {
        let err =
            validate_arguments(&json!({ "query": "x", "max_results": "four" }), &search_schema())
                .unwrap_err();
        assert!(err.contains("field 'max_results'"));
        assert!(err.contains("expected type 'integer'"));
    }

    #[test]
    fn empty_schema_accepts_anything() {
        assert!(validate_arguments(&json!({ "anything": 42 }), &json!({})).is_ok());
        assert!(validate_arguments(&Value::Null, &json!({})).is_ok());
    }
}
