//! Seam to the chat library that actually talks to the network

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use hexa_protocol::{CallbackAnswer, IncomingMessage, MessageId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    /// Server-side flood control
    #[error("flood wait: {0}")]
    Flood(String),

    #[error("channel not accessible: {0}")]
    ChannelNotFound(String),

    #[error("connection closed")]
    Disconnected,

    #[error("{0}")]
    Rpc(String),
}

impl TransportError {
    /// Whether the error says we are sending too fast
    pub fn is_flood(&self) -> bool {
        if matches!(self, TransportError::Flood(_)) {
            return true;
        }
        let text = self.to_string().to_lowercase();
        text.contains("too many commands") || text.contains("flood")
    }
}

/// Resolved channel entity
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: i64,
    pub title: String,
}

/// Which form of the callback request to send
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackVariant {
    Standard,
    /// Same request with the game flag explicitly cleared; some bots only
    /// answer this form
    NonGame,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallbackRequest {
    pub channel: String,
    pub message_id: MessageId,
    pub data: Vec<u8>,
    pub variant: CallbackVariant,
    /// Transports that support server-side deadlines should honour this; the
    /// caller also enforces it locally
    pub timeout: Duration,
}

/// Chat transport used by the automation.
///
/// Implement this over whatever client library is available. Inbound messages
/// are not part of the trait: the code driving the library pushes them into
/// [`crate::AutomatonHandle::dispatch`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Resolve a channel handle (`@name`, invite link or numeric id)
    async fn resolve_channel(&self, handle: &str) -> Result<ChannelInfo, TransportError>;

    /// Press an inline callback button
    async fn request_callback(
        &self,
        request: CallbackRequest,
    ) -> Result<CallbackAnswer, TransportError>;

    /// Send `text` to `channel` as a reply to `reply_to`
    async fn send_reply(
        &self,
        channel: &str,
        text: &str,
        reply_to: MessageId,
    ) -> Result<MessageId, TransportError>;

    /// The most recent `limit` messages in `channel`, newest first
    fn recent_messages<'a>(
        &'a self,
        channel: &'a str,
        limit: usize,
    ) -> BoxStream<'a, Result<IncomingMessage, TransportError>>;
}
