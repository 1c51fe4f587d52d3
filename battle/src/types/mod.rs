//! Attack selection and timing types

mod attack;
mod timings;

pub use attack::{AttackPreference, AttackSlot, ButtonCoordinate, ValidationError};
pub use timings::{Timings, duration_secs};
