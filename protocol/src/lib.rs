use thiserror::Error;

pub mod client;
pub mod server;

pub use client::{OperatorCommand, parse_operator_command};
pub use server::{
    Button, ButtonKind, CallbackAnswer, ClassifierRules, GameEvent, IncomingMessage, Keyboard,
    KeyboardRow, Matcher, MessageId, Rule, classify,
};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Empty message")]
    EmptyMessage,
}
