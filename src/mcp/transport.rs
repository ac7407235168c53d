//! JSON-RPC transport over streamable HTTP.
//!
//! The bridges answer POSTed JSON-RPC requests either with a plain JSON
//! body or with a single-frame SSE stream (`data: {...}`), depending on the
//! server build. Both shapes are handled here. A lazy `initialize`
//! handshake runs before the first real request and captures the
//! `Mcp-Session-Id` header for subsequent calls.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::McpError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PROTOCOL_VERSION: &str = "2025-03-26";

/// Transport seam for MCP requests. Tests substitute a scripted transport.
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send one JSON-RPC request and return its `result` value.
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, McpError>;

    /// Endpoint URL, for logging and error messages.
    fn endpoint(&self) -> &str;
}

/// Streamable-HTTP transport against a bridge endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicI64,
    session_id: Mutex<Option<String>>,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, McpError> {
        let endpoint = endpoint.into();
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| McpError::Unreachable {
                endpoint: endpoint.clone(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            endpoint,
            next_id: AtomicI64::new(1),
            session_id: Mutex::new(None),
        })
    }

    /// Run the initialize handshake if we have no session yet.
    async fn ensure_session(&self) -> Result<(), McpError> {
        let mut session = self.session_id.lock().await;
        if session.is_some() {
            return Ok(());
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "initialize",
            "params": {
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {
                    "name": "agent-hub",
                    "version": env!("CARGO_PKG_VERSION"),
                },
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json, text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| McpError::HandshakeFailed {
                endpoint: self.endpoint.clone(),
                reason: e.to_string(),
            })?;

        let new_session = response
            .headers()
            .get("Mcp-Session-Id")
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(McpError::HandshakeFailed {
                endpoint: self.endpoint.clone(),
                reason: format!("HTTP {}: {}", status.as_u16(), text),
            });
        }
        // Validate the handshake result (surfaces protocol-level errors early).
        parse_rpc_body(&text)?;

        tracing::debug!(
            endpoint = %self.endpoint,
            session = new_session.as_deref().unwrap_or("(none)"),
            "Bridge session initialized"
        );
        *session = new_session.clone();
        drop(session);

        // Fire the initialized notification; some servers require it before
        // accepting tools/call. Failure here is non-fatal.
        let notify = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
        });
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json, text/event-stream")
            .json(&notify);
        if let Some(ref sid) = new_session {
            request = request.header("Mcp-Session-Id", sid);
        }
        if let Err(e) = request.send().await {
            tracing::debug!(endpoint = %self.endpoint, "initialized notification failed: {}", e);
        }

        Ok(())
    }
}

#[async_trait]
impl McpTransport for HttpTransport {
    async fn request(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, McpError> {
        self.ensure_session().await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let mut request = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json, text/event-stream")
            .json(&body);
        if let Some(ref sid) = *self.session_id.lock().await {
            request = request.header("Mcp-Session-Id", sid);
        }

        let response = request.send().await.map_err(|e| McpError::Unreachable {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            // A stale session gets dropped so the next call re-handshakes.
            if status.as_u16() == 404 {
                *self.session_id.lock().await = None;
            }
            return Err(McpError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        parse_rpc_body(&text)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Parse a JSON-RPC response out of a plain-JSON or SSE-framed body.
pub(crate) fn parse_rpc_body(body: &str) -> Result<serde_json::Value, McpError> {
    let payload = if body.trim_start().starts_with('{') {
        body.trim().to_string()
    } else {
        // SSE: take the last data: frame (servers emit exactly one response
        // frame per request, but may precede it with log events).
        body.lines()
            .filter_map(|line| line.strip_prefix("data:"))
            .map(|data| data.trim().to_string())
            .filter(|data| data.starts_with('{'))
            .next_back()
            .ok_or_else(|| McpError::Malformed(format!("No JSON payload in body: {:.120}", body)))?
    };

    let value: serde_json::Value = serde_json::from_str(&payload)
        .map_err(|e| McpError::Malformed(format!("Invalid JSON-RPC body: {}", e)))?;

    if let Some(error) = value.get("error") {
        let code = error.get("code").and_then(|c| c.as_i64()).unwrap_or(-1);
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown error")
            .to_string();
        return Err(McpError::Rpc { code, message });
    }

    value
        .get("result")
        .cloned()
        .ok_or_else(|| McpError::Malformed("Response has neither result nor error".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json_result() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#;
        let result = parse_rpc_body(body).unwrap();
        assert_eq!(result["ok"], true);
    }

    #[test]
    fn parses_sse_framed_result() {
        let body = "event: message\ndata: {\"jsonrpc\":\"2.0\",\"id\":2,\"result\":{\"tools\":[]}}\n\n";
        let result = parse_rpc_body(body).unwrap();
        assert_eq!(result["tools"], serde_json::json!([]));
    }

    #[test]
    fn takes_last_data_frame() {
        let body = concat!(
            "data: {\"method\":\"notifications/message\",\"params\":{}}\n",
            "data: {\"jsonrpc\":\"2.0\",\"id\":3,\"result\":{\"n\":2}}\n",
        );
        let result = parse_rpc_body(body).unwrap();
        assert_eq!(result["n"], 2);
    }

    #[test]
    fn rpc_error_is_surfaced() {
        let body = r#"{"jsonrpc":"2.0","id":4,"error":{"code":-32601,"message":"Method not found"}}"#;
        let err = parse_rpc_body(body).unwrap_err();
        match err {
            McpError::Rpc { code, message } => {
                assert_eq!(code, -32601);
                assert_eq!(message, "Method not found");
            }
            other => panic!("Expected Rpc error, got {:?}", other),
        }
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert!(matches!(
            parse_rpc_body("<html>503</html>"),
            Err(McpError::Malformed(_))
        ));
    }

    #[test]
    fn missing_result_is_malformed() {
        assert!(matches!(
            parse_rpc_body(r#"{"jsonrpc":"2.0","id":5}"#),
            Err(McpError::Malformed(_))
        ));
    }
}
