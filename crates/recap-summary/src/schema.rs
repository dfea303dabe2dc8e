use std::path::Path;

use serde_json::{json, Value};

use crate::error::{Result, SummaryError};

/// JSON-shaped description of the summary the LLM must produce.
///
/// Loaded once at startup and handed to the summarizer; the top-level
/// `required` list doubles as a minimal response check.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    schema: Value,
}

impl Default for OutputSchema {
    fn default() -> Self {
        Self::new(json!({
            "type": "object",
            "properties": {
                "summary": {
                    "type": "object",
                    "description": "Condensed view of the recent conversations",
                    "properties": {
                        "summary_detail": {
                            "type": "string",
                            "description": "Free-text summary of what the user discussed, asked for and decided"
                        },
                        "topics": {
                            "type": "array",
                            "items": { "type": "string" }
                        },
                        "user_preferences": {
                            "type": "array",
                            "items": { "type": "string" }
                        }
                    },
                    "required": ["summary_detail"]
                }
            },
            "required": ["summary"]
        }))
    }
}

impl OutputSchema {
    pub fn new(schema: Value) -> Self {
        Self { schema }
    }

    /// Accepts either a bare schema or a document wrapping it under `output_schema`
    pub fn from_document(document: Value) -> Result<Self> {
        let schema = match document {
            Value::Object(mut map) if map.contains_key("output_schema") => {
                map.remove("output_schema").unwrap_or(Value::Null)
            }
            other => other,
        };

        if !schema.is_object() {
            return Err(SummaryError::Schema(
                "output schema must be a JSON object".to_string(),
            ));
        }
        Ok(Self::new(schema))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            SummaryError::Schema(format!("failed to read {}: {}", path.display(), e))
        })?;
        let document: Value = serde_json::from_str(&raw).map_err(|e| {
            SummaryError::Schema(format!("failed to parse {}: {}", path.display(), e))
        })?;
        Self::from_document(document)
    }

    pub fn as_value(&self) -> &Value {
        &self.schema
    }

    /// Top-level fields every response must carry
    pub fn required_fields(&self) -> Vec<&str> {
        self.schema
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| fields.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    pub fn to_prompt_string(&self) -> String {
        serde_json::to_string_pretty(&self.schema).unwrap_or_else(|_| self.schema.to_string())
    }

    /// Shallow shape check: an object containing every required top-level field
    pub fn validate(&self, value: &Value) -> Result<()> {
        let object = value.as_object().ok_or_else(|| {
            SummaryError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                json_type_name(value)
            ))
        })?;

        let missing: Vec<&str> = self
            .required_fields()
            .into_iter()
            .filter(|field| !object.contains_key(*field))
            .collect();

        if !missing.is_empty() {
            return Err(SummaryError::MalformedResponse(format!(
                "missing required field(s): {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
