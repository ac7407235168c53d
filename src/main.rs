use std::sync::Arc;

use agent_hub::agent::{HandlerKind, Orchestrator, SubAgent};
use agent_hub::channels::{ChannelManager, CliChannel, OutgoingResponse, StatusUpdate};
use agent_hub::config::HubConfig;
use agent_hub::llm::{create_provider, LlmConfig};
use agent_hub::mcp::{HttpTransport, McpClient};
use agent_hub::prompts;
use agent_hub::tools::{email, todo, ToolRegistry};
use futures::StreamExt;

const QUIT_WORDS: &[&str] = &["quit", "exit", "bye", "q"];

#[tokio::main]
async fn main() -> agent_hub::error::Result<()> {
    let config = match HubConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize tracing
    let default_filter = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    eprintln!("🤖 Agent Hub v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.model);
    eprintln!("   Todo bridge: {}", config.todo_mcp_url);
    eprintln!("   Email bridge: {}", config.gmail_mcp_url);
    eprintln!("   Type a message and press Enter. 'quit' to exit.\n");

    // Create LLM provider
    let llm_config = LlmConfig {
        api_key: config.api_key.clone(),
        model: config.model.clone(),
    };
    let llm = create_provider(&llm_config)?;

    // Bridge clients
    let todo_client = McpClient::new(Arc::new(HttpTransport::new(&config.todo_mcp_url)?));
    let email_client = McpClient::new(Arc::new(HttpTransport::new(&config.gmail_mcp_url)?));

    probe_bridge("todo", &todo_client).await;
    probe_bridge("email", &email_client).await;

    // Sub-agents
    let mut todo_registry = ToolRegistry::new();
    todo::register_tools(&mut todo_registry, &todo_client);
    let todo_agent = SubAgent::new(
        HandlerKind::Todo,
        llm.clone(),
        prompts::todo_system_prompt(),
        todo_registry,
    );

    let mut email_registry = ToolRegistry::new();
    email::register_tools(&mut email_registry, &email_client);
    let email_agent = SubAgent::new(
        HandlerKind::Email,
        llm.clone(),
        prompts::EMAIL_SYSTEM_PROMPT.to_string(),
        email_registry,
    );

    let orchestrator = Orchestrator::new(llm, todo_agent, email_agent);

    // Channels
    let mut channels = ChannelManager::new();
    channels.add(Box::new(CliChannel::new()));

    let mut messages = channels.start_all().await?;
    tracing::info!(
        channels = %channels.channel_names().join(", "),
        "Agent Hub ready and listening"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down...");
                break;
            }
            msg = messages.next() => {
                let Some(message) = msg else {
                    tracing::info!("All channel streams ended, shutting down...");
                    break;
                };

                let content = message.content.trim();
                if QUIT_WORDS.contains(&content.to_lowercase().as_str()) {
                    eprintln!("\n👋 Goodbye!");
                    break;
                }

                let hint = orchestrator
                    .route_hint(content)
                    .map(|label| format!(" (routing to {})", label))
                    .unwrap_or_default();
                let _ = channels
                    .send_status(&message.channel, StatusUpdate::Thinking(format!("Thinking{}...", hint)))
                    .await;

                let response = orchestrator
                    .handle_message(&message.user_id, content)
                    .await;
                if let Err(e) = channels
                    .respond(&message, OutgoingResponse::text(response))
                    .await
                {
                    tracing::error!("Failed to deliver response: {}", e);
                }
            }
        }
    }

    channels.shutdown_all().await;
    Ok(())
}

/// Startup health probe. A down bridge is a warning, not a fatal error:
/// its tools will surface errors the LLM can explain to the user.
async fn probe_bridge(name: &str, client: &McpClient) {
    match client.list_tools().await {
        Ok(tools) => {
            tracing::info!(
                bridge = name,
                endpoint = client.endpoint(),
                tools = tools.len(),
                "bridge connected"
            );
            for tool in &tools {
                tracing::debug!(bridge = name, tool = %tool.name, description = %tool.description, "bridge tool");
            }
        }
        Err(e) => {
            tracing::warn!(bridge = name, endpoint = client.endpoint(), error = %e, "bridge unreachable");
            eprintln!("⚠️  {} bridge unreachable at {}: {}", name, client.endpoint(), e);
            eprintln!("   Check that the bridge process is running and its credentials are configured.");
        }
    }
}
