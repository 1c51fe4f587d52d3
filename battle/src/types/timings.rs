use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delays applied by the state machine before it acts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    /// Pause before clicking, so the automation does not look mechanical
    #[serde(rename = "smoothing_secs", with = "duration_secs")]
    pub smoothing: Duration,

    /// How long a sent challenge may go unanswered before it is resent
    #[serde(rename = "watchdog_secs", with = "duration_secs")]
    pub watchdog: Duration,

    /// Wait after a prize before challenging again
    #[serde(rename = "restart_secs", with = "duration_secs")]
    pub restart: Duration,

    /// Wait when someone else holds the shared battle slot
    #[serde(rename = "currently_battling_secs", with = "duration_secs")]
    pub currently_battling: Duration,

    /// Wait between challenges once the daily limit is hit
    #[serde(rename = "daily_limit_secs", with = "duration_secs")]
    pub daily_limit: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            smoothing: Duration::from_secs(1),
            watchdog: Duration::from_secs(60),
            restart: Duration::from_secs(5),
            currently_battling: Duration::from_secs(120),
            daily_limit: Duration::from_secs(3),
        }
    }
}

/// (De)serialize a `Duration` as fractional seconds
pub mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs)
            .map_err(|_| D::Error::custom(format!("invalid duration in seconds: {}", secs)))
    }
}
