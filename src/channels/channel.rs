//! The `Channel` trait and its message types.

use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;

use crate::error::ChannelError;

pub type MessageStream = Pin<Box<dyn Stream<Item = IncomingMessage> + Send>>;

/// A message arriving from a channel.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    /// Name of the channel the message came in on.
    pub channel: String,
    /// Stable identifier for the sender, keys conversation state.
    pub user_id: String,
    pub content: String,
    pub received_at: DateTime<Utc>,
}

impl IncomingMessage {
    pub fn new(
        channel: impl Into<String>,
        user_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            user_id: user_id.into(),
            content: content.into(),
            received_at: Utc::now(),
        }
    }
}

/// A response headed back out on a channel.
#[derive(Debug, Clone)]
pub struct OutgoingResponse {
    pub content: String,
}

impl OutgoingResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// Progress signals shown while a request is being handled.
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    /// The hub is working; the string may carry a routing hint.
    Thinking(String),
    Status(String),
}

/// A bidirectional message channel (CLI, and whatever comes next).
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Start the channel and return its stream of incoming messages.
    async fn start(&self) -> Result<MessageStream, ChannelError>;

    /// Deliver a response for a previously received message.
    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError>;

    /// Best-effort progress display; channels may ignore it.
    async fn send_status(&self, _status: StatusUpdate) -> Result<(), ChannelError> {
        Ok(())
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}
