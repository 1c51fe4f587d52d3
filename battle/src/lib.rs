//! Automation state and attack selection for the HeXamon battle bot.
//!
//! This crate holds everything about the automation that can be decided without
//! touching the network: which phase the automation is in, how each classified
//! message moves it, and which button an attack number maps to.
//!
//! # Overview
//!
//! ```text
//! hexa-protocol (message model + classifier)
//!        │
//!        ▼
//! hexa-battle (automation state + transitions) ← THIS CRATE
//!        │
//!        ▼
//! hexa-client (actor, retries, timers, transport)
//! ```
//!
//! # Main Types
//!
//! - [`AutomationState`] - the single automation record, see [`AutomationState::update`]
//! - [`Phase`] - `Idle`, `Waiting`, `Challenging` or `InBattle`, derived from the state
//! - [`Reaction`] - what the runtime should do after a transition
//! - [`Timings`] - delays applied by the state machine
//! - [`AttackSlot`], [`ButtonCoordinate`] - attack numbers 1-4 and their grid cell
//!
//! # Example Usage
//!
//! ```ignore
//! use std::time::Instant;
//! use hexa_battle::{Action, AutomationState, Timings};
//! use hexa_protocol::GameEvent;
//!
//! let timings = Timings::default();
//! let mut state = AutomationState::new();
//!
//! state.start();
//! let ticket = state.challenge_sent(Instant::now());
//!
//! let reaction = state.update(GameEvent::BattleStarted, &timings);
//! assert_eq!(reaction.action, Some(Action::ClickButton));
//! assert!(reaction.cancel_watchdog);
//! ```

pub mod tracking;
pub mod types;

pub use tracking::{Action, AutomationState, Phase, Reaction, WatchdogTicket};
pub use types::{
    AttackPreference, AttackSlot, ButtonCoordinate, Timings, ValidationError, duration_secs,
};

// Re-export commonly used protocol types
pub use hexa_protocol::GameEvent;
