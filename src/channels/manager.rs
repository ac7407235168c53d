//! Channel manager — merges channel streams and dispatches responses.

use futures::stream;
use tracing::{error, info};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;

/// Owns every active channel and fans their messages into one stream.
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    pub fn add(&mut self, channel: Box<dyn Channel>) {
        info!(channel = channel.name(), "channel registered");
        self.channels.push(channel);
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Start every channel and merge their streams. A channel that fails
    /// to start is logged and skipped, the rest keep running.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::new();
        for channel in &self.channels {
            match channel.start().await {
                Ok(stream) => streams.push(stream),
                Err(e) => error!(channel = channel.name(), error = %e, "channel failed to start"),
            }
        }
        if streams.is_empty() {
            return Err(ChannelError::StartupFailed {
                name: "all".to_string(),
                reason: "no channel started successfully".to_string(),
            });
        }
        Ok(Box::pin(stream::select_all(streams)))
    }

    /// Route a response back to the channel the message arrived on.
    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        let channel = self.find(&msg.channel)?;
        channel.respond(msg, response).await
    }

    pub async fn send_status(
        &self,
        channel_name: &str,
        status: StatusUpdate,
    ) -> Result<(), ChannelError> {
        let channel = self.find(channel_name)?;
        channel.send_status(status).await
    }

    pub async fn shutdown_all(&self) {
        for channel in &self.channels {
            if let Err(e) = channel.shutdown().await {
                error!(channel = channel.name(), error = %e, "shutdown failed");
            }
        }
    }

    fn find(&self, name: &str) -> Result<&dyn Channel, ChannelError> {
        self.channels
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
            .ok_or_else(|| ChannelError::SendFailed {
                name: name.to_string(),
                reason: "no such channel".to_string(),
            })
    }
}

impl Default for ChannelManager {
    fn default() -> Self {
        Self::new()
    }
}
