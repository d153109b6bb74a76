//! Character domain model.
//!
//! # Responsibility
//! - Define the persistent player-progression record.
//! - Provide validation for progression invariants.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another character.
//! - `level` equals `level_for(experience)` at all times; it is persisted
//!   for querying but never allowed to drift from `experience`.
//! - `experience`, `coins` and `total_study_minutes` are non-negative.

use crate::progression::rewards::level_for;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a character.
pub type CharacterId = Uuid;

/// Cosmetic color shown while no color skin is equipped.
pub const BASE_COLOR: &str = "#8B4513";

/// Persistent player-progression record.
///
/// Mutated only through session-stop reward application or equipment
/// transactions; never deleted in normal operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Stable global ID used for linking and auditing.
    pub uuid: CharacterId,
    /// Display name chosen at creation.
    pub name: String,
    /// Derived from `experience`; see `validate`.
    pub level: i64,
    /// Accumulated experience, monotonically non-decreasing.
    pub experience: i64,
    /// Spendable coin balance. Purchases decrement it, never below zero.
    pub coins: i64,
    /// Total finished study time in minutes.
    pub total_study_minutes: f64,
    /// Current cosmetic color. `BASE_COLOR` means no skin is equipped.
    pub current_color: String,
    /// Creation instant in Unix epoch milliseconds.
    pub created_at: i64,
}

/// Validation failures for character state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacterValidationError {
    EmptyName,
    NegativeCounter(&'static str),
    LevelDrift { level: i64, expected: i64 },
}

impl Display for CharacterValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "character name cannot be empty"),
            Self::NegativeCounter(field) => {
                write!(f, "character field `{field}` cannot be negative")
            }
            Self::LevelDrift { level, expected } => write!(
                f,
                "character level {level} does not match experience-derived level {expected}"
            ),
        }
    }
}

impl Error for CharacterValidationError {}

impl Character {
    /// Creates a fresh level-1 character.
    ///
    /// # Invariants
    /// - Starts with zero experience, zero coins and no study time.
    /// - `current_color` starts at `BASE_COLOR`.
    pub fn new(name: impl Into<String>, now_ms: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            level: 1,
            experience: 0,
            coins: 0,
            total_study_minutes: 0.0,
            current_color: BASE_COLOR.to_string(),
            created_at: now_ms,
        }
    }

    /// Checks progression invariants.
    ///
    /// Called on write paths before SQL mutations and on read paths so
    /// that drifted persisted state is rejected instead of masked.
    pub fn validate(&self) -> Result<(), CharacterValidationError> {
        if self.name.trim().is_empty() {
            return Err(CharacterValidationError::EmptyName);
        }
        if self.experience < 0 {
            return Err(CharacterValidationError::NegativeCounter("experience"));
        }
        if self.coins < 0 {
            return Err(CharacterValidationError::NegativeCounter("coins"));
        }
        if self.total_study_minutes < 0.0 {
            return Err(CharacterValidationError::NegativeCounter(
                "total_study_minutes",
            ));
        }
        let expected = level_for(self.experience);
        if self.level != expected {
            return Err(CharacterValidationError::LevelDrift {
                level: self.level,
                expected,
            });
        }
        Ok(())
    }

    /// Returns whether a color skin is currently applied.
    pub fn has_color_skin(&self) -> bool {
        self.current_color != BASE_COLOR
    }
}

#[cfg(test)]
mod tests {
    use super::{Character, CharacterValidationError, BASE_COLOR};

    #[test]
    fn new_character_is_valid_and_unstyled() {
        let character = Character::new("mio", 1_000);
        character.validate().unwrap();
        assert_eq!(character.level, 1);
        assert_eq!(character.current_color, BASE_COLOR);
        assert!(!character.has_color_skin());
    }

    #[test]
    fn validate_rejects_empty_name() {
        let character = Character::new("   ", 0);
        assert_eq!(
            character.validate().unwrap_err(),
            CharacterValidationError::EmptyName
        );
    }

    #[test]
    fn validate_rejects_level_drift() {
        let mut character = Character::new("mio", 0);
        character.experience = 650;
        character.level = 2;
        assert_eq!(
            character.validate().unwrap_err(),
            CharacterValidationError::LevelDrift {
                level: 2,
                expected: 3
            }
        );

        character.level = 3;
        character.validate().unwrap();
    }

    #[test]
    fn validate_rejects_negative_counters() {
        let mut character = Character::new("mio", 0);
        character.coins = -1;
        assert_eq!(
            character.validate().unwrap_err(),
            CharacterValidationError::NegativeCounter("coins")
        );
    }
}
