//! Orchestration layer: conversation state, sub-agents, and the
//! orchestrator that routes between them.

pub mod conversation;
pub mod orchestrator;
pub mod sub_agent;

pub use conversation::{Conversation, HandlerKind, MAX_HISTORY_MESSAGES};
pub use orchestrator::Orchestrator;
pub use sub_agent::SubAgent;
