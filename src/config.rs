//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-lite";
pub const DEFAULT_TODO_MCP_URL: &str = "http://127.0.0.1:8080/mcp/";
pub const DEFAULT_GMAIL_MCP_URL: &str = "http://127.0.0.1:5001/mcp/";

/// Hub configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// API key for the LLM provider.
    pub api_key: SecretString,
    /// Model identifier.
    pub model: String,
    /// Endpoint of the todo bridge.
    pub todo_mcp_url: String,
    /// Endpoint of the email bridge.
    pub gmail_mcp_url: String,
    /// Verbose logging default.
    pub debug: bool,
}

impl HubConfig {
    /// Read configuration from the environment.
    ///
    /// `GOOGLE_API_KEY` is required; everything else falls back to the
    /// defaults the local bridges run with.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| ConfigError::MissingEnvVar {
            key: "GOOGLE_API_KEY".to_string(),
            hint: "export GOOGLE_API_KEY=... (an AI Studio API key)".to_string(),
        })?;

        Ok(Self {
            api_key: SecretString::from(api_key),
            model: env_or("AGENT_HUB_MODEL", DEFAULT_MODEL),
            todo_mcp_url: env_or("TODO_MCP_URL", DEFAULT_TODO_MCP_URL),
            gmail_mcp_url: env_or("GMAIL_MCP_URL", DEFAULT_GMAIL_MCP_URL),
            debug: env_flag("AGENT_HUB_DEBUG"),
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_flag(key: &str) -> bool {
    matches!(
        std::env::var(key).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}
