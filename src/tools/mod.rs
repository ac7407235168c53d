//! Tools exposed to the sub-agents.
//!
//! Every tool here is a thin wrapper over one bridge tool: it validates
//! parameters, forwards the call through the `McpClient`, and formats the
//! returned payload into conversational text.

pub mod email;
pub mod registry;
pub mod todo;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolOutput};

use crate::mcp::McpClient;

/// Call a bridge tool, turning transport failures into text the model can
/// read and recover from.
pub(crate) async fn call_bridge(
    client: &McpClient,
    tool: &str,
    args: serde_json::Value,
) -> Result<serde_json::Value, String> {
    client
        .call_tool(tool, args)
        .await
        .map_err(|e| format!("Error calling bridge tool {tool}: {e}"))
}

/// Extract the `error` field a bridge puts inside a failed payload.
pub(crate) fn payload_error(payload: &serde_json::Value) -> Option<String> {
    payload.get("error").map(|e| match e.as_str() {
        Some(s) => s.to_string(),
        None => e.to_string(),
    })
}

/// Call a bridge tool and unwrap the payload, short-circuiting with an
/// `Ok(ToolOutput)` error text when the bridge or the payload reports failure.
macro_rules! bridge_call {
    ($client:expr, $tool:expr, $args:expr) => {
        match $crate::tools::call_bridge($client, $tool, $args).await {
            Ok(payload) => {
                if let Some(reason) = $crate::tools::payload_error(&payload) {
                    return Ok($crate::tools::ToolOutput::text(format!("Error: {reason}")));
                }
                payload
            }
            Err(text) => return Ok($crate::tools::ToolOutput::text(text)),
        }
    };
}

pub(crate) use bridge_call;
