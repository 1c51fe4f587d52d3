//! Attack numbers and the inline keyboard cells they select

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("attack number must be between 1 and 4, got {0}")]
    AttackOutOfRange(i64),
}

/// A cell in the opponent's inline keyboard (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ButtonCoordinate {
    pub row: usize,
    pub col: usize,
}

impl ButtonCoordinate {
    /// Attack 3: second row, first column of the 2x2 move grid
    pub const DEFAULT: Self = Self { row: 1, col: 0 };

    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl Default for ButtonCoordinate {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for ButtonCoordinate {
    /// Human form is 1-indexed
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}, column {}", self.row + 1, self.col + 1)
    }
}

/// One of the four attacks, numbered 1-4 left to right, top to bottom
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttackSlot(u8);

impl AttackSlot {
    pub const DEFAULT: Self = Self(3);

    pub fn new(number: i64) -> Result<Self, ValidationError> {
        match number {
            1..=4 => Ok(Self(number as u8)),
            _ => Err(ValidationError::AttackOutOfRange(number)),
        }
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    pub fn coordinate(&self) -> ButtonCoordinate {
        let index = usize::from(self.0 - 1);
        ButtonCoordinate::new(index / 2, index % 2)
    }

    pub fn label(&self) -> String {
        format!("Attack {}", self.0)
    }
}

impl TryFrom<i64> for AttackSlot {
    type Error = ValidationError;

    fn try_from(number: i64) -> Result<Self, Self::Error> {
        Self::new(number)
    }
}

/// A user's saved attack choice, in the persisted record shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackPreference {
    pub row: usize,
    pub col: usize,
    #[serde(rename = "attack_name")]
    pub label: String,
}

impl AttackPreference {
    pub fn coordinate(&self) -> ButtonCoordinate {
        ButtonCoordinate::new(self.row, self.col)
    }
}

impl From<AttackSlot> for AttackPreference {
    fn from(slot: AttackSlot) -> Self {
        let ButtonCoordinate { row, col } = slot.coordinate();
        Self {
            row,
            col,
            label: slot.label(),
        }
    }
}
