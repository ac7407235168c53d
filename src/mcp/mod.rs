//! MCP client layer — talks to the local protocol bridges.
//!
//! Each bridge (todo on :8080, email on :5001) exposes MCP over streamable
//! HTTP. The transport handles the JSON-RPC framing and session handshake;
//! the client unwraps tool-call results into plain JSON payloads.

pub mod client;
pub mod transport;

pub use client::McpClient;
pub use transport::{HttpTransport, McpTransport};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use crate::error::McpError;
    use crate::mcp::transport::McpTransport;

    /// Scripted transport: returns canned results and records requests.
    pub(crate) struct FakeTransport {
        pub responses: Mutex<Vec<Result<serde_json::Value, McpError>>>,
        pub requests: Mutex<Vec<(String, serde_json::Value)>>,
    }

    impl FakeTransport {
        pub(crate) fn with_responses(
            responses: Vec<Result<serde_json::Value, McpError>>,
        ) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl McpTransport for FakeTransport {
        async fn request(
            &self,
            method: &str,
            params: serde_json::Value,
        ) -> Result<serde_json::Value, McpError> {
            self.requests
                .lock()
                .await
                .push((method.to_string(), params));
            let mut responses = self.responses.lock().await;
            if responses.is_empty() {
                return Err(McpError::Malformed("no scripted response".into()));
            }
            responses.remove(0)
        }

        fn endpoint(&self) -> &str {
            "fake://bridge"
        }
    }

    /// Wrap an inner payload the way bridges frame tool results.
    pub(crate) fn tool_result(inner: serde_json::Value) -> serde_json::Value {
        serde_json::json!({
            "content": [{"type": "text", "text": inner.to_string()}],
            "isError": false,
        })
    }
}
