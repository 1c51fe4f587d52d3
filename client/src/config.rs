//! Bot configuration, loaded from a TOML file.

use std::path::{Path, PathBuf};

use hexa_battle::{AttackSlot, ButtonCoordinate, Timings};
use hexa_protocol::{ClassifierRules, MessageId, server::rules::BATTLE_KEYWORDS};
use serde::Deserialize;
use thiserror::Error;

use crate::policy::RetryPolicy;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "HEXA_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "hexa.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Bot configuration.
///
/// ```toml
/// channel = "@hexamon_arena"
/// opponent = "HeXamonbot"
/// target_message_id = 4512
///
/// [timings]
/// watchdog_secs = 90
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Channel the battles happen in
    pub channel: String,
    /// Username of the opponent bot; only its messages are classified
    pub opponent: String,
    /// Message the challenge command is sent as a reply to
    pub target_message_id: MessageId,
    #[serde(default = "default_challenge_command")]
    pub challenge_command: String,
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,
    /// Attack clicked for users who never chose one (1-4)
    #[serde(default = "default_attack")]
    pub default_attack: i64,
    /// How many recent messages to scan for battle activity
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_battle_keywords")]
    pub battle_keywords: Vec<String>,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub retry: RetryPolicy,
    #[serde(default)]
    pub rules: ClassifierRules,
}

fn default_challenge_command() -> String {
    "/challenge".to_string()
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("attack_config.json")
}

fn default_attack() -> i64 {
    i64::from(AttackSlot::DEFAULT.number())
}

fn default_history_limit() -> usize {
    10
}

fn default_battle_keywords() -> Vec<String> {
    BATTLE_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

impl BotConfig {
    /// Config with every optional field at its default
    pub fn new(channel: &str, opponent: &str, target_message_id: MessageId) -> Self {
        Self {
            channel: channel.to_string(),
            opponent: opponent.to_string(),
            target_message_id,
            challenge_command: default_challenge_command(),
            preferences_path: default_preferences_path(),
            default_attack: default_attack(),
            history_limit: default_history_limit(),
            battle_keywords: default_battle_keywords(),
            timings: Timings::default(),
            retry: RetryPolicy::default(),
            rules: ClassifierRules::default(),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from `$HEXA_CONFIG`, falling back to `hexa.toml`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load(&path)
    }

    pub fn default_coordinate(&self) -> ButtonCoordinate {
        AttackSlot::new(self.default_attack)
            .map(|slot| slot.coordinate())
            .unwrap_or(ButtonCoordinate::DEFAULT)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.channel.trim().is_empty() {
            return Err(ConfigError::Invalid("channel must not be empty".to_string()));
        }
        if self.opponent.trim().is_empty() {
            return Err(ConfigError::Invalid("opponent must not be empty".to_string()));
        }
        if self.challenge_command.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "challenge_command must not be empty".to_string(),
            ));
        }
        AttackSlot::new(self.default_attack)
            .map_err(|e| ConfigError::Invalid(format!("default_attack: {}", e)))?;
        Ok(())
    }
}
