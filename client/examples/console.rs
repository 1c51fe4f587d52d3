//! Drive the automation from the terminal.
//!
//! Lines starting with `/` are operator commands. Lines starting with `>` are
//! played as opponent messages and carry the four-move keyboard. Everything
//! the automation would send is printed instead.
//!
//! ```text
//! cargo run --example console
//! /run
//! > Battle begins!
//! > You have received 💵 50
//! ```

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use hexa_client::{
    Automaton, BotConfig, Button, CallbackAnswer, CallbackRequest, ChannelInfo, ConfigError,
    IncomingMessage, Keyboard, MessageId, Transport, TransportError, init_tracing,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;

const OPERATOR_ID: i64 = 1;

#[derive(Default)]
struct ConsoleTransport {
    history: Mutex<Vec<IncomingMessage>>,
    next_id: Mutex<MessageId>,
}

impl ConsoleTransport {
    fn next_id(&self) -> MessageId {
        let mut id = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        *id += 1;
        *id
    }

    fn record(&self, message: IncomingMessage) {
        if let Ok(mut history) = self.history.lock() {
            history.insert(0, message);
        }
    }
}

#[async_trait]
impl Transport for ConsoleTransport {
    async fn resolve_channel(&self, handle: &str) -> Result<ChannelInfo, TransportError> {
        Ok(ChannelInfo {
            id: 0,
            title: handle.to_string(),
        })
    }

    async fn request_callback(
        &self,
        request: CallbackRequest,
    ) -> Result<CallbackAnswer, TransportError> {
        println!(
            "<< click {} on message {} ({:?})",
            String::from_utf8_lossy(&request.data),
            request.message_id,
            request.variant
        );
        Ok(CallbackAnswer::empty())
    }

    async fn send_reply(
        &self,
        channel: &str,
        text: &str,
        reply_to: MessageId,
    ) -> Result<MessageId, TransportError> {
        println!("<< [{}] {} (reply to {})", channel, text, reply_to);
        Ok(self.next_id())
    }

    fn recent_messages<'a>(
        &'a self,
        _channel: &'a str,
        limit: usize,
    ) -> BoxStream<'a, Result<IncomingMessage, TransportError>> {
        let messages: Vec<_> = self
            .history
            .lock()
            .map(|h| h.iter().take(limit).cloned().map(Ok).collect())
            .unwrap_or_default();
        stream::iter(messages).boxed()
    }
}

fn move_keyboard() -> Keyboard {
    Keyboard::new(vec![
        vec![
            Button::callback("Attack 1", b"move-1"),
            Button::callback("Attack 2", b"move-2"),
        ],
        vec![
            Button::callback("Attack 3", b"move-3"),
            Button::callback("Attack 4", b"move-4"),
        ],
    ])
}

fn load_config() -> Result<BotConfig> {
    match BotConfig::from_env() {
        Ok(config) => Ok(config),
        Err(ConfigError::Io { path, .. }) => {
            warn!(path = %path.display(), "no config file, using demo settings");
            let mut config = BotConfig::new("@hexamon_arena", "HeXamonbot", 1);
            config.preferences_path = std::env::temp_dir().join("hexa_attack_config.json");
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config()?;
    let opponent = config.opponent.clone();
    let transport = Arc::new(ConsoleTransport::default());

    let (automaton, handle) = Automaton::new(transport.clone(), config);
    let task = automaton.spawn();

    println!("Type /guide for commands, '> text' to play an opponent message, Ctrl-D to quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let id = transport.next_id();
        let message = if let Some(text) = line.strip_prefix('>') {
            IncomingMessage::new(id, &opponent, text.trim()).with_keyboard(move_keyboard())
        } else {
            IncomingMessage {
                id,
                sender: Some("operator".to_string()),
                sender_id: Some(OPERATOR_ID),
                text: line.to_string(),
                outgoing: true,
                ..IncomingMessage::default()
            }
        };

        transport.record(message.clone());
        if let Some(reply) = handle.dispatch(message).await? {
            println!("{}", reply);
        }
    }

    handle.shutdown()?;
    task.await??;
    Ok(())
}
