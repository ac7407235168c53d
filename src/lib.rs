//! Agent Hub — master agent that routes requests to specialized sub-agents.

pub mod agent;
pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod mcp;
pub mod prompts;
pub mod router;
pub mod tools;
