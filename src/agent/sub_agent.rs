//! Sub-agent: a reasoning loop bound to one tool registry.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::agent::HandlerKind;
use crate::error::LlmError;
use crate::llm::{
    ChatMessage, LlmProvider, Reasoning, ReasoningContext, RespondResult, ToolCall,
};
use crate::tools::ToolRegistry;

/// Hard cap on reasoning iterations per user turn.
const MAX_TOOL_ITERATIONS: usize = 8;

const ITERATION_LIMIT_RESPONSE: &str =
    "I wasn't able to finish that request within the allowed number of steps. \
     Could you try breaking it into smaller parts?";

/// A specialized agent that runs an LLM loop over a fixed tool set.
///
/// The loop alternates between model calls and tool executions until the
/// model answers with plain text or the iteration cap is hit. All tool
/// exchanges are appended to the caller's history so follow-up turns can
/// refer back to IDs the tools surfaced.
pub struct SubAgent {
    kind: HandlerKind,
    reasoning: Reasoning,
    tools: ToolRegistry,
}

impl SubAgent {
    pub fn new(
        kind: HandlerKind,
        llm: Arc<dyn LlmProvider>,
        system_prompt: String,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            kind,
            reasoning: Reasoning::new(llm).with_system_prompt(system_prompt),
            tools,
        }
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    /// Handle one user turn, mutating `history` in place.
    pub async fn handle(
        &self,
        request: &str,
        history: &mut Vec<ChatMessage>,
    ) -> Result<String, LlmError> {
        history.push(ChatMessage::user(request));

        for iteration in 1..=MAX_TOOL_ITERATIONS {
            let context = ReasoningContext::new()
                .with_messages(history.clone())
                .with_tools(self.tools.definitions());

            let output = self.reasoning.respond_with_tools(&context).await?;
            debug!(
                handler = self.kind.label(),
                iteration,
                tokens = output.usage.total(),
                "reasoning step complete"
            );

            match output.result {
                RespondResult::Text(text) => {
                    history.push(ChatMessage::assistant(text.clone()));
                    return Ok(text);
                }
                RespondResult::ToolCalls {
                    tool_calls,
                    content,
                } => {
                    history.push(ChatMessage::assistant_with_calls(
                        content.unwrap_or_default(),
                        tool_calls.clone(),
                    ));
                    for call in &tool_calls {
                        let result = self.execute_call(call).await;
                        history.push(ChatMessage::tool_result(call, result));
                    }
                }
            }
        }

        warn!(
            handler = self.kind.label(),
            limit = MAX_TOOL_ITERATIONS,
            "iteration cap reached without a final answer"
        );
        history.push(ChatMessage::assistant(ITERATION_LIMIT_RESPONSE));
        Ok(ITERATION_LIMIT_RESPONSE.to_string())
    }

    /// Run one tool call. Failures become payloads the model can read.
    async fn execute_call(&self, call: &ToolCall) -> serde_json::Value {
        let Some(tool) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "model requested unknown tool");
            let err = crate::error::ToolError::NotFound {
                name: call.name.clone(),
            };
            return serde_json::json!({"error": err.to_string()});
        };

        match tool.execute(call.arguments.clone()).await {
            Ok(output) => serde_json::Value::String(output.text),
            Err(e) => {
                warn!(tool = %call.name, error = %e, "tool execution failed");
                serde_json::json!({"error": e.to_string()})
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LlmError, ToolError};
    use crate::llm::{
        CompletionRequest, CompletionResponse, ToolCompletionRequest, ToolCompletionResponse,
    };
    use crate::tools::{Tool, ToolOutput};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::Mutex;

    /// Provider that replays scripted tool-completion responses.
    struct ScriptedProvider {
        responses: Mutex<Vec<ToolCompletionResponse>>,
        requests: Mutex<Vec<ToolCompletionRequest>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<ToolCompletionResponse>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            Err(LlmError::RequestFailed {
                provider: "scripted".into(),
                reason: "plain completion not scripted".into(),
            })
        }

        async fn complete_with_tools(
            &self,
            request: ToolCompletionRequest,
        ) -> Result<ToolCompletionResponse, LlmError> {
            self.requests.lock().await.push(request);
            let mut responses = self.responses.lock().await;
            if responses.is_empty() {
                return Err(LlmError::RequestFailed {
                    provider: "scripted".into(),
                    reason: "no scripted response".into(),
                });
            }
            Ok(responses.remove(0))
        }
    }

    struct RecordingTool {
        calls: Arc<Mutex<Vec<Value>>>,
        reply: String,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            "list_task_lists"
        }

        fn description(&self) -> &str {
            "Lists task lists"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, params: Value) -> Result<ToolOutput, ToolError> {
            self.calls.lock().await.push(params);
            Ok(ToolOutput::text(self.reply.clone()))
        }
    }

    fn text_response(text: &str) -> ToolCompletionResponse {
        ToolCompletionResponse {
            content: Some(text.to_string()),
            tool_calls: vec![],
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    fn call_response(name: &str) -> ToolCompletionResponse {
        ToolCompletionResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: format!("{name}-1"),
                name: name.to_string(),
                arguments: json!({}),
            }],
            input_tokens: 0,
            output_tokens: 0,
        }
    }

    fn registry_with(tool: RecordingTool) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(tool));
        registry
    }

    #[tokio::test]
    async fn loop_runs_tools_then_returns_text() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::new(vec![
            call_response("list_task_lists"),
            text_response("You have one list: Work"),
        ]);
        let agent = SubAgent::new(
            HandlerKind::Todo,
            provider.clone(),
            "test prompt".to_string(),
            registry_with(RecordingTool {
                calls: calls.clone(),
                reply: "Found 1 task lists:\n1. Work (ID: l1)".to_string(),
            }),
        );

        let mut history = Vec::new();
        let response = agent.handle("show my lists", &mut history).await.unwrap();
        assert_eq!(response, "You have one list: Work");
        assert_eq!(calls.lock().await.len(), 1);

        // user, assistant+calls, tool result, final assistant
        assert_eq!(history.len(), 4);
        let second_request = &provider.requests.lock().await[1];
        let tool_msg = second_request
            .messages
            .iter()
            .find(|m| m.tool_result.is_some())
            .unwrap();
        assert!(tool_msg
            .tool_result
            .as_ref()
            .unwrap()
            .content
            .to_string()
            .contains("Work"));
    }

    #[tokio::test]
    async fn unknown_tool_becomes_error_payload() {
        let provider = ScriptedProvider::new(vec![
            call_response("no_such_tool"),
            text_response("Sorry, I can't do that."),
        ]);
        let agent = SubAgent::new(
            HandlerKind::Todo,
            provider.clone(),
            "test prompt".to_string(),
            registry_with(RecordingTool {
                calls: Arc::new(Mutex::new(Vec::new())),
                reply: "ok".to_string(),
            }),
        );

        let mut history = Vec::new();
        let response = agent.handle("do something", &mut history).await.unwrap();
        assert_eq!(response, "Sorry, I can't do that.");

        let second_request = &provider.requests.lock().await[1];
        let tool_msg = second_request
            .messages
            .iter()
            .find(|m| m.tool_result.is_some())
            .unwrap();
        assert!(tool_msg
            .tool_result
            .as_ref()
            .unwrap()
            .content
            .to_string()
            .contains("not found"));
    }

    #[tokio::test]
    async fn iteration_cap_returns_fallback() {
        let responses = (0..10).map(|_| call_response("list_task_lists")).collect();
        let provider = ScriptedProvider::new(responses);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let agent = SubAgent::new(
            HandlerKind::Todo,
            provider,
            "test prompt".to_string(),
            registry_with(RecordingTool {
                calls: calls.clone(),
                reply: "ok".to_string(),
            }),
        );

        let mut history = Vec::new();
        let response = agent.handle("loop forever", &mut history).await.unwrap();
        assert_eq!(response, ITERATION_LIMIT_RESPONSE);
        assert_eq!(calls.lock().await.len(), MAX_TOOL_ITERATIONS);
    }

    #[tokio::test]
    async fn llm_failure_propagates() {
        let provider = ScriptedProvider::new(vec![]);
        let agent = SubAgent::new(
            HandlerKind::Email,
            provider,
            "test prompt".to_string(),
            registry_with(RecordingTool {
                calls: Arc::new(Mutex::new(Vec::new())),
                reply: "ok".to_string(),
            }),
        );

        let mut history = Vec::new();
        assert!(agent.handle("check mail", &mut history).await.is_err());
    }
}
