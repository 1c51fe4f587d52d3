//! Scripted transport for unit tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use hexa_protocol::{Button, CallbackAnswer, IncomingMessage, Keyboard, MessageId};

use crate::config::BotConfig;
use crate::transport::{CallbackRequest, ChannelInfo, Transport, TransportError};

pub const CHANNEL: &str = "@hexamon_arena";
pub const OPPONENT: &str = "HeXamonbot";
pub const TARGET: MessageId = 4512;

pub fn config() -> BotConfig {
    BotConfig::new(CHANNEL, OPPONENT, TARGET)
}

/// Opponent message with the 2x2 move grid
pub fn battle_message(id: MessageId) -> IncomingMessage {
    battle_text(id, "Battle begins!")
}

pub fn battle_text(id: MessageId, text: &str) -> IncomingMessage {
    IncomingMessage::new(id, OPPONENT, text).with_keyboard(Keyboard::new(vec![
        vec![
            Button::callback("Tackle", b"move-1"),
            Button::callback("Ember", b"move-2"),
        ],
        vec![
            Button::callback("Bite", b"move-3"),
            Button::callback("Rest", b"move-4"),
        ],
    ]))
}

/// Operator command typed from our own account
pub fn command(id: MessageId, user_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        id,
        sender: Some("operator".to_string()),
        sender_id: Some(user_id),
        text: text.to_string(),
        outgoing: true,
        ..IncomingMessage::default()
    }
}

pub enum CallbackScript {
    Answer(CallbackAnswer),
    Error(TransportError),
    /// Never completes; exercises the local timeout
    Hang,
}

impl CallbackScript {
    pub fn answer(text: &str) -> Self {
        if text.is_empty() {
            Self::Answer(CallbackAnswer::empty())
        } else {
            Self::Answer(CallbackAnswer::with_message(text))
        }
    }

    pub fn error(text: &str) -> Self {
        Self::Error(TransportError::Rpc(text.to_string()))
    }
}

/// Transport whose responses are queued up front. Unscripted calls succeed.
#[derive(Default)]
pub struct MockTransport {
    callback_script: Mutex<VecDeque<CallbackScript>>,
    send_script: Mutex<VecDeque<Result<MessageId, TransportError>>>,
    history: Mutex<Vec<IncomingMessage>>,
    history_fails: Mutex<bool>,
    callbacks: Mutex<Vec<CallbackRequest>>,
    sends: Mutex<Vec<(String, String, MessageId)>>,
    history_reads: Mutex<usize>,
    missing_channel: Mutex<bool>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_callback(&self, script: CallbackScript) {
        self.callback_script.lock().unwrap().push_back(script);
    }

    pub fn push_send(&self, result: Result<MessageId, TransportError>) {
        self.send_script.lock().unwrap().push_back(result);
    }

    pub fn set_history(&self, messages: Vec<IncomingMessage>) {
        *self.history.lock().unwrap() = messages;
    }

    pub fn fail_history(&self) {
        *self.history_fails.lock().unwrap() = true;
    }

    pub fn hide_channel(&self) {
        *self.missing_channel.lock().unwrap() = true;
    }

    pub fn callbacks(&self) -> Vec<CallbackRequest> {
        self.callbacks.lock().unwrap().clone()
    }

    pub fn sends(&self) -> Vec<(String, String, MessageId)> {
        self.sends.lock().unwrap().clone()
    }

    pub fn history_reads(&self) -> usize {
        *self.history_reads.lock().unwrap()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn resolve_channel(&self, handle: &str) -> Result<ChannelInfo, TransportError> {
        if *self.missing_channel.lock().unwrap() {
            return Err(TransportError::ChannelNotFound(handle.to_string()));
        }
        Ok(ChannelInfo {
            id: -1001,
            title: handle.trim_start_matches('@').to_string(),
        })
    }

    async fn request_callback(
        &self,
        request: CallbackRequest,
    ) -> Result<CallbackAnswer, TransportError> {
        self.callbacks.lock().unwrap().push(request);
        let next = self.callback_script.lock().unwrap().pop_front();
        match next {
            Some(CallbackScript::Answer(answer)) => Ok(answer),
            Some(CallbackScript::Error(e)) => Err(e),
            Some(CallbackScript::Hang) => std::future::pending().await,
            None => Ok(CallbackAnswer::empty()),
        }
    }

    async fn send_reply(
        &self,
        channel: &str,
        text: &str,
        reply_to: MessageId,
    ) -> Result<MessageId, TransportError> {
        let mut sends = self.sends.lock().unwrap();
        sends.push((channel.to_string(), text.to_string(), reply_to));
        let id = 10_000 + sends.len() as MessageId;
        drop(sends);

        self.send_script.lock().unwrap().pop_front().unwrap_or(Ok(id))
    }

    fn recent_messages<'a>(
        &'a self,
        _channel: &'a str,
        limit: usize,
    ) -> BoxStream<'a, Result<IncomingMessage, TransportError>> {
        *self.history_reads.lock().unwrap() += 1;
        if *self.history_fails.lock().unwrap() {
            return stream::iter(vec![Err(TransportError::Disconnected)]).boxed();
        }
        let messages: Vec<_> = self
            .history
            .lock()
            .unwrap()
            .iter()
            .take(limit)
            .cloned()
            .map(Ok)
            .collect();
        stream::iter(messages).boxed()
    }
}
