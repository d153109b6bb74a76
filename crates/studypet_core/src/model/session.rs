//! Study session domain model.
//!
//! # Responsibility
//! - Define one timed study interval with start and eventual end instants.
//!
//! # Invariants
//! - `ended_at == None` marks a running (or orphaned) session.
//! - `duration_minutes` is 0 while running and set exactly once at stop.
//! - Only finished sessions count toward statistics.

use crate::model::character::CharacterId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a study session.
pub type SessionId = Uuid;

/// One timed study interval owned by a character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    /// Stable global ID, also the active-timer registry key.
    pub uuid: SessionId,
    /// Owning character.
    pub character_uuid: CharacterId,
    /// Optional free-text subject label.
    pub subject: Option<String>,
    /// Elapsed minutes, finalized at stop time. Zero while running.
    pub duration_minutes: f64,
    /// Start instant in Unix epoch milliseconds.
    pub started_at: i64,
    /// End instant in Unix epoch milliseconds. `None` while running.
    pub ended_at: Option<i64>,
}

impl StudySession {
    /// Creates a running session stub starting now.
    pub fn start(character_uuid: CharacterId, subject: Option<&str>, now_ms: i64) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            character_uuid,
            subject: subject.map(str::to_string),
            duration_minutes: 0.0,
            started_at: now_ms,
            ended_at: None,
        }
    }

    /// Returns whether the session has been finalized.
    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }
}
