//! Per-user conversation state.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::llm::{ChatMessage, Role};

/// Upper bound on retained messages per history, oldest dropped first.
pub const MAX_HISTORY_MESSAGES: usize = 40;

/// The specialized handlers the orchestrator can delegate to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Todo,
    Email,
}

impl HandlerKind {
    /// Human-readable name used in status lines and error text.
    pub fn label(&self) -> &'static str {
        match self {
            HandlerKind::Todo => "Todo Agent",
            HandlerKind::Email => "Email Agent",
        }
    }
}

/// State of one user's conversation with the hub.
///
/// The orchestrator keeps its own history for general questions; each
/// handler keeps a separate history so tool exchanges (and the IDs they
/// surface) stay available for follow-ups like "delete the second one".
pub struct Conversation {
    pub id: Uuid,
    /// Orchestrator-level history: user turns and final responses.
    pub history: Vec<ChatMessage>,
    /// Per-handler histories, including tool call exchanges.
    handler_histories: HashMap<HandlerKind, Vec<ChatMessage>>,
    /// Which handler served the last delegated turn.
    pub current_context: Option<HandlerKind>,
    pub last_active_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            history: Vec::new(),
            handler_histories: HashMap::new(),
            current_context: None,
            last_active_at: Utc::now(),
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage::user(content));
        self.trim();
        self.last_active_at = Utc::now();
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(ChatMessage::assistant(content));
        self.trim();
    }

    /// Mutable access to one handler's history, trimmed to the bound.
    pub fn handler_history(&mut self, kind: HandlerKind) -> &mut Vec<ChatMessage> {
        let history = self.handler_histories.entry(kind).or_default();
        trim_to_turn_boundary(history);
        history
    }

    pub fn record_delegation(&mut self, kind: HandlerKind) {
        self.current_context = Some(kind);
        self.last_active_at = Utc::now();
    }

    fn trim(&mut self) {
        trim_to_turn_boundary(&mut self.history);
    }
}

/// Drops oldest messages past the bound, then keeps dropping until the
/// history starts on a user turn. A cut inside a tool exchange would leave
/// a function response with no originating call, which Gemini rejects.
fn trim_to_turn_boundary(history: &mut Vec<ChatMessage>) {
    if history.len() <= MAX_HISTORY_MESSAGES {
        return;
    }
    let mut start = history.len() - MAX_HISTORY_MESSAGES;
    while start < history.len() && history[start].role != Role::User {
        start += 1;
    }
    history.drain(..start);
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
