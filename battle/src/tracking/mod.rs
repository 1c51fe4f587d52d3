//! Automation state tracking from classified game events

mod machine;
mod state;

pub use machine::{Action, Reaction};
pub use state::{AutomationState, Phase, WatchdogTicket};
