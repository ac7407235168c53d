//! The `Tool` trait and parameter helpers.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ToolError;
use crate::llm::ToolDefinition;

/// Output produced by a tool execution.
///
/// Tools render everything, including bridge-reported failures, as
/// conversational text so the model can read the outcome and recover.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub text: String,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// A capability a sub-agent can invoke during its reasoning loop.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name, as advertised to the model.
    fn name(&self) -> &str;

    /// One-line description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with the given parameters.
    async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError>;

    /// Definition handed to the LLM provider.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Extract a required string parameter.
pub fn require_str<'a>(tool: &str, params: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::InvalidParameters {
            name: tool.to_string(),
            reason: format!("missing required string parameter '{key}'"),
        })
}

/// Extract an optional string parameter.
pub fn optional_str<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

/// Extract an optional unsigned integer parameter.
pub fn optional_u64(params: &Value, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn require_str_reports_missing_key() {
        let err = require_str("create_task", &json!({}), "title").unwrap_err();
        assert!(err.to_string().contains("title"));
        assert!(err.to_string().contains("create_task"));
    }

    #[test]
    fn require_str_rejects_non_string() {
        assert!(require_str("create_task", &json!({"title": 7}), "title").is_err());
        assert_eq!(
            require_str("create_task", &json!({"title": "buy milk"}), "title").unwrap(),
            "buy milk"
        );
    }
}
