use std::time::Duration;

use hexa_battle::duration_secs;
use serde::{Deserialize, Serialize};

/// Why the executor is about to wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// The opponent answered the click with "too many requests" / "please try again"
    ClickRejected,
    /// The click did not complete within `click_timeout`
    ClickTimedOut,
    /// Flood error while we know a battle is running; give up this send
    FloodInBattle,
    /// Flood error and recent history shows battle activity; give up this send
    FloodBattleDetected,
    /// Flood error with no sign of a battle; send again
    FloodNoBattle,
}

/// Delays for the click and challenge retry loops.
///
/// There is no attempt ceiling: the opponent's failures are transient, so the
/// loops keep going until success, a structural error or a stop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    #[serde(rename = "click_timeout_secs", with = "duration_secs")]
    pub click_timeout: Duration,
    #[serde(rename = "click_rejected_secs", with = "duration_secs")]
    pub click_rejected: Duration,
    #[serde(rename = "click_timeout_retry_secs", with = "duration_secs")]
    pub click_timeout_retry: Duration,
    #[serde(rename = "flood_in_battle_secs", with = "duration_secs")]
    pub flood_in_battle: Duration,
    #[serde(rename = "flood_battle_detected_secs", with = "duration_secs")]
    pub flood_battle_detected: Duration,
    #[serde(rename = "flood_retry_secs", with = "duration_secs")]
    pub flood_retry: Duration,
}

impl RetryPolicy {
    pub fn delay(&self, backoff: Backoff) -> Duration {
        match backoff {
            Backoff::ClickRejected => self.click_rejected,
            Backoff::ClickTimedOut => self.click_timeout_retry,
            Backoff::FloodInBattle => self.flood_in_battle,
            Backoff::FloodBattleDetected => self.flood_battle_detected,
            Backoff::FloodNoBattle => self.flood_retry,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            click_timeout: Duration::from_secs(10),
            click_rejected: Duration::from_secs(3),
            click_timeout_retry: Duration::from_secs(5),
            flood_in_battle: Duration::from_secs(5),
            flood_battle_detected: Duration::from_secs(10),
            flood_retry: Duration::from_secs(3),
        }
    }
}
