//! Messages received from the game channel

mod event;
mod keyboard;
pub mod rules;

use std::sync::LazyLock;

pub use event::GameEvent;
pub use keyboard::{Button, ButtonKind, Keyboard, KeyboardRow};
pub use rules::{ClassifierRules, Matcher, Rule};

/// Message identifier within a channel
pub type MessageId = i64;

/// A new or edited message observed in the watched channel
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IncomingMessage {
    pub id: MessageId,
    /// Username of the author, without the leading `@`
    pub sender: Option<String>,
    /// Numeric id of the author, used as the preference key for operators
    pub sender_id: Option<i64>,
    pub text: String,
    /// Inline keyboard attached to the message, if any
    pub keyboard: Option<Keyboard>,
    /// Whether this delivery is an edit of an earlier message
    pub edited: bool,
    /// Whether the message was sent by our own account
    pub outgoing: bool,
}

impl IncomingMessage {
    pub fn new(id: MessageId, sender: &str, text: &str) -> Self {
        Self {
            id,
            sender: Some(sender.to_string()),
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }

    /// Key used for per-user settings: the numeric id if known, else the username
    pub fn sender_key(&self) -> Option<String> {
        self.sender_id
            .map(|id| id.to_string())
            .or_else(|| self.sender.clone())
    }

    /// Check whether the message was authored by `username` (case-insensitive,
    /// a leading `@` on either side is ignored)
    pub fn is_from(&self, username: &str) -> bool {
        let wanted = username.trim_start_matches('@');
        self.sender
            .as_deref()
            .map(|s| s.trim_start_matches('@').eq_ignore_ascii_case(wanted))
            .unwrap_or(false)
    }
}

/// Answer to a callback query
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CallbackAnswer {
    /// Text shown to the user as a toast or alert, if the bot sent one
    pub message: Option<String>,
}

impl CallbackAnswer {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_message(message: &str) -> Self {
        Self {
            message: Some(message.to_string()),
        }
    }
}

static DEFAULT_RULES: LazyLock<ClassifierRules> = LazyLock::new(ClassifierRules::default);

/// Classify a message with the built-in rule table
pub fn classify(text: &str) -> GameEvent {
    DEFAULT_RULES.classify(text)
}
