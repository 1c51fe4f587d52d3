//! Per-user attack choices, persisted as a JSON object keyed by user id.
//!
//! ```json
//! { "123456": { "row": 0, "col": 1, "attack_name": "Attack 2" } }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hexa_battle::{AttackPreference, AttackSlot, ButtonCoordinate, ValidationError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("preference file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("preference file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct PreferenceStore {
    path: Option<PathBuf>,
    entries: BTreeMap<String, AttackPreference>,
    default: ButtonCoordinate,
}

impl PreferenceStore {
    /// Load the store from `path`. A missing or unreadable file gives an
    /// empty store; the file is created on the first `set`.
    pub fn load(path: impl Into<PathBuf>, default: ButtonCoordinate) -> Self {
        let path = path.into();
        let entries = match read_entries(&path) {
            Ok(entries) => {
                info!(path = %path.display(), users = entries.len(), "loaded attack preferences");
                entries
            }
            Err(PreferenceError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(path = %path.display(), "no preference file yet");
                BTreeMap::new()
            }
            Err(e) => {
                error!(error = %e, "failed to load attack preferences, starting empty");
                BTreeMap::new()
            }
        };

        Self {
            path: Some(path),
            entries,
            default,
        }
    }

    /// Store that never touches the disk
    pub fn in_memory(default: ButtonCoordinate) -> Self {
        Self {
            path: None,
            entries: BTreeMap::new(),
            default,
        }
    }

    /// Coordinate to click for `user`
    pub fn get(&self, user: &str) -> ButtonCoordinate {
        self.entries
            .get(user)
            .map(AttackPreference::coordinate)
            .unwrap_or(self.default)
    }

    pub fn preference(&self, user: &str) -> Option<&AttackPreference> {
        self.entries.get(user)
    }

    pub fn default_coordinate(&self) -> ButtonCoordinate {
        self.default
    }

    /// Record `attack` (1-4) for `user` and write the file.
    ///
    /// Out-of-range numbers leave the store untouched. A failed write is
    /// logged; the in-memory value still applies for this run.
    pub fn set(&mut self, user: &str, attack: i64) -> Result<AttackPreference, ValidationError> {
        let slot = AttackSlot::new(attack)?;
        let preference = AttackPreference::from(slot);

        self.entries.insert(user.to_string(), preference.clone());
        info!(user, attack = slot.number(), coordinate = %slot.coordinate(), "attack preference set");

        if let Err(e) = self.save() {
            warn!(error = %e, "failed to persist attack preferences");
        }
        Ok(preference)
    }

    fn save(&self) -> Result<(), PreferenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, json).map_err(|source| PreferenceError::Io {
            path: path.clone(),
            source,
        })
    }
}

fn read_entries(path: &Path) -> Result<BTreeMap<String, AttackPreference>, PreferenceError> {
    let text = std::fs::read_to_string(path).map_err(|source| PreferenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&text)?)
}
