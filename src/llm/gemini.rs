//! Google Gemini provider — `generateContent` over HTTP.
//!
//! Request/response mapping:
//! - `Role::System` messages are folded into `systemInstruction`.
//! - `Role::Assistant` maps to Gemini's `model` role; tool calls become
//!   `functionCall` parts.
//! - `Role::Tool` results go back as `functionResponse` parts under the
//!   `user` role, which is how Gemini expects function results.

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, Role, ToolCall,
    ToolCompletionRequest, ToolCompletionResponse, ToolDefinition,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Gemini provider over reqwest.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, model: &str) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LlmError::RequestFailed {
                provider: "gemini".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: model.to_string(),
        })
    }

    /// Override the API base URL (tests point this at a local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn generate(&self, body: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed {
                provider: "gemini".to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            let text = response.text().await.unwrap_or_default();
            return Err(classify_error(status, retry_after, &text));
        }

        response.json().await.map_err(|e| LlmError::InvalidResponse {
            provider: "gemini".to_string(),
            reason: format!("Failed to parse response body: {}", e),
        })
    }
}

/// Map an HTTP failure to the LlmError taxonomy.
fn classify_error(status: StatusCode, retry_after: Option<Duration>, body: &str) -> LlmError {
    match status.as_u16() {
        401 | 403 => LlmError::AuthFailed {
            provider: "gemini".to_string(),
        },
        429 => LlmError::RateLimited {
            provider: "gemini".to_string(),
            retry_after,
        },
        _ => LlmError::RequestFailed {
            provider: "gemini".to_string(),
            reason: format!("HTTP {}: {}", status.as_u16(), truncate(body, 300)),
        },
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max).collect()
    } else {
        s.to_string()
    }
}

#[async_trait::async_trait]
impl LlmProvider for GeminiProvider {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = build_request(&request.messages, &[]);
        let response = self.generate(&body).await?;
        let (content, tool_calls, usage) = extract_response(response)?;

        if !tool_calls.is_empty() {
            tracing::warn!("Model issued tool calls on a plain completion; ignoring them");
        }

        Ok(CompletionResponse {
            content: content.unwrap_or_default(),
            input_tokens: usage.0,
            output_tokens: usage.1,
        })
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> Result<ToolCompletionResponse, LlmError> {
        let body = build_request(&request.messages, &request.tools);
        let response = self.generate(&body).await?;
        let (content, tool_calls, usage) = extract_response(response)?;

        Ok(ToolCompletionResponse {
            content,
            tool_calls,
            input_tokens: usage.0,
            output_tokens: usage.1,
        })
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTools>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireTools {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<WireFunctionDeclaration>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<WireFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<WireFunctionResponse>,
}

impl WirePart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<WireContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

// ── Conversion ───────────────────────────────────────────────────────

fn build_request(messages: &[ChatMessage], tools: &[ToolDefinition]) -> GenerateRequest {
    let mut system_parts: Vec<String> = Vec::new();
    let mut contents: Vec<WireContent> = Vec::new();

    for message in messages {
        match message.role {
            Role::System => system_parts.push(message.content.clone()),
            Role::User => contents.push(WireContent {
                role: Some("user".into()),
                parts: vec![WirePart::text(&message.content)],
            }),
            Role::Assistant => {
                let mut parts = Vec::new();
                if !message.content.is_empty() {
                    parts.push(WirePart::text(&message.content));
                }
                for call in &message.tool_calls {
                    parts.push(WirePart {
                        text: None,
                        function_call: Some(WireFunctionCall {
                            name: call.name.clone(),
                            args: call.arguments.clone(),
                        }),
                        function_response: None,
                    });
                }
                if parts.is_empty() {
                    parts.push(WirePart::text(""));
                }
                contents.push(WireContent {
                    role: Some("model".into()),
                    parts,
                });
            }
            Role::Tool => {
                if let Some(ref result) = message.tool_result {
                    // functionResponse.response must be an object.
                    let response = if result.content.is_object() {
                        result.content.clone()
                    } else {
                        serde_json::json!({ "result": result.content })
                    };
                    contents.push(WireContent {
                        role: Some("user".into()),
                        parts: vec![WirePart {
                            text: None,
                            function_call: None,
                            function_response: Some(WireFunctionResponse {
                                name: result.name.clone(),
                                response,
                            }),
                        }],
                    });
                }
            }
        }
    }

    let system_instruction = if system_parts.is_empty() {
        None
    } else {
        Some(WireContent {
            role: None,
            parts: vec![WirePart::text(system_parts.join("\n\n"))],
        })
    };

    let tools = if tools.is_empty() {
        Vec::new()
    } else {
        vec![WireTools {
            function_declarations: tools
                .iter()
                .map(|t| WireFunctionDeclaration {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                })
                .collect(),
        }]
    };

    GenerateRequest {
        system_instruction,
        contents,
        tools,
    }
}

type Usage = (u32, u32);

fn extract_response(
    response: GenerateResponse,
) -> Result<(Option<String>, Vec<ToolCall>, Usage), LlmError> {
    let usage = response
        .usage_metadata
        .map(|u| (u.prompt_token_count, u.candidates_token_count))
        .unwrap_or((0, 0));

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse {
            provider: "gemini".to_string(),
            reason: "No candidates in response".to_string(),
        })?;

    let mut text_parts: Vec<String> = Vec::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    if let Some(content) = candidate.content {
        for part in content.parts {
            if let Some(text) = part.text {
                text_parts.push(text);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall {
                    id: format!("{}-{}", call.name, uuid::Uuid::new_v4().simple()),
                    name: call.name,
                    arguments: call.args,
                });
            }
        }
    }

    let content = if text_parts.is_empty() {
        None
    } else {
        Some(text_parts.join(""))
    };

    Ok((content, tool_calls, usage))
}
