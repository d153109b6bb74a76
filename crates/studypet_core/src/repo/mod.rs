//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Write paths validate domain records before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Repository APIs return semantic errors (`CharacterNotFound`,
//!   `SessionNotFound`) in addition to DB transport errors.

use crate::db::DbError;
use crate::model::character::{CharacterId, CharacterValidationError};
use crate::model::session::SessionId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod character_repo;
pub mod equipment_repo;
pub mod ledger_repo;
pub mod session_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(CharacterValidationError),
    Db(DbError),
    CharacterNotFound(CharacterId),
    SessionNotFound(SessionId),
    EquipmentNotFound(String),
    InvalidData(String),
}

impl RepoError {
    /// Whether the underlying failure is transient lock contention.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Db(err) if err.is_retryable())
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::CharacterNotFound(id) => write!(f, "character not found: {id}"),
            Self::SessionNotFound(id) => write!(f, "session not found: {id}"),
            Self::EquipmentNotFound(id) => write!(f, "equipment not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::CharacterNotFound(_)
            | Self::SessionNotFound(_)
            | Self::EquipmentNotFound(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<CharacterValidationError> for RepoError {
    fn from(value: CharacterValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
