//! LLM integration for Agent Hub.
//!
//! The hub talks to Google Gemini (`generateContent`) over plain HTTP with
//! function-calling support. The provider sits behind the `LlmProvider`
//! trait so the orchestrator and sub-agents can be driven by a scripted
//! provider in tests.

mod gemini;
pub mod reasoning;

pub use gemini::GeminiProvider;
pub use reasoning::{Reasoning, ReasoningContext, RespondOutput, RespondResult, TokenUsage};

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::LlmError;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
    /// A tool/function result fed back to the model.
    Tool,
}

/// A tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    /// Synthetic call id (Gemini does not assign ids).
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// A tool result carried by a `Role::Tool` message.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub call_id: String,
    pub name: String,
    pub content: serde_json::Value,
}

/// A provider-neutral chat message.
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    /// Tool calls issued by an assistant message (empty otherwise).
    pub tool_calls: Vec<ToolCall>,
    /// Tool result payload for `Role::Tool` messages.
    pub tool_result: Option<ToolResult>,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_result: None,
        }
    }

    /// An assistant turn that requested tool calls (content may be empty).
    pub fn assistant_with_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            tool_calls,
            tool_result: None,
        }
    }

    /// A tool result message answering a previous tool call.
    pub fn tool_result(call: &ToolCall, content: serde_json::Value) -> Self {
        Self {
            role: Role::Tool,
            content: String::new(),
            tool_calls: Vec::new(),
            tool_result: Some(ToolResult {
                call_id: call.id.clone(),
                name: call.name.clone(),
                content,
            }),
        }
    }
}

/// A tool definition advertised to the model.
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the parameters object.
    pub parameters: serde_json::Value,
}

/// A plain completion request (no tools).
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}

/// Response to a plain completion request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// A completion request with tool definitions.
#[derive(Debug, Clone)]
pub struct ToolCompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolDefinition>,
}

impl ToolCompletionRequest {
    pub fn new(messages: Vec<ChatMessage>, tools: Vec<ToolDefinition>) -> Self {
        Self { messages, tools }
    }
}

/// Response to a tool completion request.
#[derive(Debug, Clone)]
pub struct ToolCompletionResponse {
    /// Text content alongside (or instead of) tool calls.
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Provider abstraction over a hosted LLM.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Model identifier this provider is bound to.
    fn model_name(&self) -> &str;

    /// Plain text completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Completion with function-calling enabled.
    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError>;
}

/// Configuration for creating an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: secrecy::SecretString,
    pub model: String,
}

/// Create the Gemini provider from configuration.
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let provider = GeminiProvider::new(config.api_key.clone(), &config.model)?;
    tracing::info!("Using Gemini (model: {})", config.model);
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_provider_constructs_with_any_key() {
        // Auth failures only surface when a request is made.
        let config = LlmConfig {
            api_key: secrecy::SecretString::from("test-key"),
            model: "gemini-2.0-flash-lite".to_string(),
        };
        let provider = create_provider(&config);
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().model_name(), "gemini-2.0-flash-lite");
    }

    #[test]
    fn tool_result_message_carries_call_identity() {
        let call = ToolCall {
            id: "call-1".into(),
            name: "list_tasks".into(),
            arguments: serde_json::json!({"list_id": "abc"}),
        };
        let msg = ChatMessage::tool_result(&call, serde_json::json!({"tasks": []}));
        assert_eq!(msg.role, Role::Tool);
        let result = msg.tool_result.expect("tool result");
        assert_eq!(result.name, "list_tasks");
        assert_eq!(result.call_id, "call-1");
    }
}
