//! Battle automation for the HeXamon chat bot.
//!
//! The crate drives a [`Transport`] implementation: it watches the opponent's
//! messages, clicks the configured attack, and keeps re-challenging until it
//! is paused.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # async fn demo<T: hexa_client::Transport + 'static>(transport: T) -> anyhow::Result<()> {
//! let config = hexa_client::BotConfig::from_env()?;
//! let (automaton, handle) = hexa_client::Automaton::new(Arc::new(transport), config);
//! let task = automaton.spawn();
//!
//! handle.start(None).await?;
//! // feed messages from the chat library with handle.dispatch(...)
//! handle.shutdown()?;
//! task.await??;
//! # Ok(())
//! # }
//! ```

mod automaton;
pub mod commands;
pub mod config;
pub mod executor;
mod logging;
pub mod policy;
pub mod preferences;
pub mod transport;
mod watchdog;

#[cfg(test)]
mod test_support;

pub use automaton::{Automaton, AutomatonHandle};
pub use commands::StatusReport;
pub use config::{BotConfig, ConfigError};
pub use executor::{ActionExecutor, ChallengeOutcome, ClickOutcome, StandDown, StructuralError};
pub use logging::init_tracing;
pub use policy::{Backoff, RetryPolicy};
pub use preferences::PreferenceStore;
pub use transport::{CallbackRequest, CallbackVariant, ChannelInfo, Transport, TransportError};
pub use watchdog::Watchdog;

pub use hexa_battle::{AttackPreference, ButtonCoordinate, Phase, Timings};
pub use hexa_protocol::{
    Button, CallbackAnswer, GameEvent, IncomingMessage, Keyboard, MessageId, OperatorCommand,
};
