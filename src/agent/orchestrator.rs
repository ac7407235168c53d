//! The orchestrator: routes each utterance to a handler or answers it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::agent::conversation::{Conversation, HandlerKind};
use crate::agent::sub_agent::SubAgent;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};
use crate::prompts;
use crate::router::{KeywordRouter, RouteMatch};

const CLARIFICATION_RESPONSE: &str =
    "I'm not sure whether that's about your tasks or your email. Could you \
     rephrase it? For example: 'show my tasks' or 'check my unread emails'.";

/// Where one utterance ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Delegate(HandlerKind),
    General,
    Clarify,
}

/// Routes utterances between the todo and email sub-agents, answering
/// general questions itself. Holds per-user conversation state.
pub struct Orchestrator {
    llm: Arc<dyn LlmProvider>,
    router: KeywordRouter,
    todo: SubAgent,
    email: SubAgent,
    conversations: RwLock<HashMap<String, Arc<Mutex<Conversation>>>>,
}

impl Orchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>, todo: SubAgent, email: SubAgent) -> Self {
        Self {
            llm,
            router: KeywordRouter::new(),
            todo,
            email,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    /// Routing hint for the channel's status line, keyword pass only.
    pub fn route_hint(&self, text: &str) -> Option<&'static str> {
        self.router.hint_label(text)
    }

    /// Handle one user message. Handler failures come back as readable
    /// text rather than errors, the session keeps going.
    pub async fn handle_message(&self, user_id: &str, text: &str) -> String {
        let conversation = self.conversation_for(user_id).await;
        let mut conv = conversation.lock().await;

        let decision = self.decide(text, conv.current_context).await;
        debug!(user = user_id, ?decision, "routing decision");

        let response = match decision {
            Decision::Delegate(kind) => {
                conv.push_user(text);
                let handler = self.handler(kind);
                let result = handler.handle(text, conv.handler_history(kind)).await;
                conv.record_delegation(kind);
                match result {
                    Ok(response) => response,
                    Err(e) => {
                        warn!(handler = kind.label(), error = %e, "handler failed");
                        format!("Error with {}: {}", kind.label(), e)
                    }
                }
            }
            Decision::General => {
                conv.push_user(text);
                self.answer_directly(&conv.history).await
            }
            Decision::Clarify => {
                conv.push_user(text);
                CLARIFICATION_RESPONSE.to_string()
            }
        };

        conv.push_assistant(response.clone());
        response
    }

    fn handler(&self, kind: HandlerKind) -> &SubAgent {
        match kind {
            HandlerKind::Todo => &self.todo,
            HandlerKind::Email => &self.email,
        }
    }

    /// Keyword pass first; the LLM classifier only runs on ties.
    async fn decide(&self, text: &str, context: Option<HandlerKind>) -> Decision {
        match self.router.classify(text) {
            RouteMatch::Todo => Decision::Delegate(HandlerKind::Todo),
            RouteMatch::Email => Decision::Delegate(HandlerKind::Email),
            RouteMatch::Both | RouteMatch::None => self.classify_with_llm(text, context).await,
        }
    }

    async fn classify_with_llm(&self, text: &str, context: Option<HandlerKind>) -> Decision {
        let mut messages = vec![ChatMessage::system(prompts::CLASSIFIER_SYSTEM_PROMPT)];
        if let Some(kind) = context {
            messages.push(ChatMessage::system(format!(
                "The previous request in this conversation was handled by the {}.",
                kind.label()
            )));
        }
        messages.push(ChatMessage::user(text));

        let response = match self.llm.complete(CompletionRequest::new(messages)).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "classification call failed");
                return Decision::Clarify;
            }
        };

        let answer = response.content.trim().to_lowercase();
        if answer.contains("todo") {
            Decision::Delegate(HandlerKind::Todo)
        } else if answer.contains("email") {
            Decision::Delegate(HandlerKind::Email)
        } else if answer.contains("general") {
            Decision::General
        } else {
            info!(answer = %answer, "unusable classification answer");
            Decision::Clarify
        }
    }

    /// Plain completion over the orchestrator-level history.
    async fn answer_directly(&self, history: &[ChatMessage]) -> String {
        let mut messages = vec![ChatMessage::system(prompts::MASTER_SYSTEM_PROMPT)];
        messages.extend(history.iter().cloned());

        match self.llm.complete(CompletionRequest::new(messages)).await {
            Ok(response) => response.content,
            Err(e) => {
                warn!(error = %e, "direct answer failed");
                format!("Error: {e}. Please try again.")
            }
        }
    }

    async fn conversation_for(&self, user_id: &str) -> Arc<Mutex<Conversation>> {
        if let Some(conv) = self.conversations.read().await.get(user_id) {
            return conv.clone();
        }
        let mut conversations = self.conversations.write().await;
        conversations
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new())))
            .clone()
    }
}
