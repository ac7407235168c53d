//! MCP client — tool calls against one bridge.

use std::sync::Arc;

use crate::error::McpError;
use crate::mcp::transport::McpTransport;

/// A remote tool advertised by a bridge.
#[derive(Debug, Clone)]
pub struct RemoteTool {
    pub name: String,
    pub description: String,
}

/// Client bound to a single bridge endpoint.
#[derive(Clone)]
pub struct McpClient {
    transport: Arc<dyn McpTransport>,
}

impl McpClient {
    pub fn new(transport: Arc<dyn McpTransport>) -> Self {
        Self { transport }
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// List the tools the bridge advertises. Used as a startup health probe.
    pub async fn list_tools(&self) -> Result<Vec<RemoteTool>, McpError> {
        let result = self
            .transport
            .request("tools/list", serde_json::json!({}))
            .await?;

        let tools = result
            .get("tools")
            .and_then(|t| t.as_array())
            .ok_or_else(|| McpError::Malformed("tools/list result has no tools array".into()))?;

        Ok(tools
            .iter()
            .filter_map(|tool| {
                Some(RemoteTool {
                    name: tool.get("name")?.as_str()?.to_string(),
                    description: tool
                        .get("description")
                        .and_then(|d| d.as_str())
                        .unwrap_or_default()
                        .to_string(),
                })
            })
            .collect())
    }

    /// Call a bridge tool and return its payload.
    ///
    /// Bridge tools answer with a `content` array whose first text item is a
    /// JSON document; that inner document is what callers get. Application
    /// errors arrive inside the payload as `{"error": ...}` and are passed
    /// through for the LLM to see.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, McpError> {
        let result = self
            .transport
            .request(
                "tools/call",
                serde_json::json!({
                    "name": name,
                    "arguments": arguments,
                }),
            )
            .await?;

        let payload = unwrap_tool_result(&result)?;
        tracing::debug!(
            tool = %name,
            endpoint = %self.transport.endpoint(),
            ok = payload.get("error").is_none(),
            "Bridge tool call completed"
        );
        Ok(payload)
    }
}

/// Unwrap `result.content[0].text` into the inner JSON payload.
fn unwrap_tool_result(result: &serde_json::Value) -> Result<serde_json::Value, McpError> {
    // Some servers put structured output directly on the result.
    if let Some(structured) = result.get("structuredContent") {
        return Ok(structured.clone());
    }

    let text = result
        .get("content")
        .and_then(|c| c.as_array())
        .and_then(|items| items.first())
        .and_then(|item| item.get("text"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| McpError::Malformed("Tool result has no text content".into()))?;

    serde_json::from_str(text)
        .map_err(|e| McpError::Malformed(format!("Tool result text is not JSON: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::testing::{tool_result, FakeTransport};

    #[tokio::test]
    async fn call_tool_unwraps_inner_json() {
        let transport = FakeTransport::with_responses(vec![Ok(tool_result(serde_json::json!({
            "taskLists": [{"id": "l1", "name": "Work"}]
        })))]);
        let client = McpClient::new(transport.clone());

        let payload = client
            .call_tool("list_task_lists", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(payload["taskLists"][0]["name"], "Work");

        let requests = transport.requests.lock().await;
        assert_eq!(requests[0].0, "tools/call");
        assert_eq!(requests[0].1["name"], "list_task_lists");
    }

    #[tokio::test]
    async fn call_tool_passes_through_error_payload() {
        let transport = FakeTransport::with_responses(vec![Ok(tool_result(serde_json::json!({
            "error": "Authentication failed"
        })))]);
        let client = McpClient::new(transport);

        let payload = client
            .call_tool("list_tasks", serde_json::json!({"list_id": "x"}))
            .await
            .unwrap();
        assert_eq!(payload["error"], "Authentication failed");
    }

    #[tokio::test]
    async fn call_tool_prefers_structured_content() {
        let transport = FakeTransport::with_responses(vec![Ok(serde_json::json!({
            "structuredContent": {"success": true},
            "content": [{"type": "text", "text": "not json"}],
        }))]);
        let client = McpClient::new(transport);

        let payload = client.call_tool("create_task", serde_json::json!({})).await.unwrap();
        assert_eq!(payload["success"], true);
    }

    #[tokio::test]
    async fn non_json_text_is_malformed() {
        let transport = FakeTransport::with_responses(vec![Ok(serde_json::json!({
            "content": [{"type": "text", "text": "plain words"}],
        }))]);
        let client = McpClient::new(transport);

        let err = client
            .call_tool("list_labels", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, McpError::Malformed(_)));
    }

    #[tokio::test]
    async fn list_tools_parses_names() {
        let transport = FakeTransport::with_responses(vec![Ok(serde_json::json!({
            "tools": [
                {"name": "list_task_lists", "description": "Lists all task lists"},
                {"name": "create_task", "description": "Creates a task"},
            ]
        }))]);
        let client = McpClient::new(transport);

        let tools = client.list_tools().await.unwrap();
        assert_eq!(tools.len(), 2);
        assert_eq!(tools[0].name, "list_task_lists");
    }
}
