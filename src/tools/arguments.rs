//! Typed access to tool call arguments.

use crate::error::ScoutError;

/// Wrapper around tool call arguments providing typed extraction.
#[derive(Debug, Clone)]
pub struct ToolArguments {
    value: serde_json::Value,
}

impl ToolArguments {
    pub fn new(value: serde_json::Value) -> Self {
        Self { value }
    }

    /// Get the raw JSON value.
    pub fn raw(&self) -> &serde_json::Value {
        &self.value
    }

    /// Get a string argument by key.
    pub fn get_str(&self, key: &str) -> Result<&str, ScoutError> {
        self.value
            .get(key)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ScoutError::InvalidArgument(format!("Missing string argument: {key}")))
    }

    /// Get an optional string argument.
    pub fn get_str_opt(&self, key: &str) -> Option<&str> {
        self.value.get(key).and_then(|v| v.as_str())
    }

    /// Get an optional non-negative integer argument.
    pub fn get_u64_opt(&self, key: &str) -> Option<u64> {
        self.value.get(key).and_then(|v| v.as_u64())
    }

    /// Deserialize the entire arguments into a typed struct.
    ///
    /// Arguments that arrived as a raw JSON string are parsed first.
    pub fn deserialize<T: serde::de::DeserializeOwned>(&self) -> Result<T, ScoutError> {
        let value = match &self.value {
            serde_json::Value::String(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    serde_json::json!({})
                } else {
                    serde_json::from_str::<serde_json::Value>(trimmed).map_err(|e| {
                        ScoutError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
                    })?
                }
            }
            other => other.clone(),
        };
        serde_json::from_value(value).map_err(|e| {
            ScoutError::InvalidArgument(format!("Failed to deserialize arguments: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Query {
        query: String,
    }

    #[test]
    fn get_str_reports_missing_key() {
        let args = ToolArguments::new(json!({ "query": "rust" }));
        assert_eq!(args.get_str("query").unwrap(), "rust");
        assert!(matches!(
            args.get_str("missing"),
            Err(ScoutError::InvalidArgument(_))
        ));
    }

    #[test]
    fn deserialize_accepts_stringified_json() {
        let args = ToolArguments::new(json!("{\"query\":\"weather\"}"));
        let parsed: Query = args.deserialize().unwrap();
        assert_eq!(parsed.query, "weather");
    }
}
