//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository, registry and reward-rule calls into use-case
//!   level APIs.
//! - Keep callers (CLI, request layer) decoupled from storage details.
//!
//! # Invariants
//! - Services never bypass repository validation/persistence contracts.
//! - All reward and shop mutations go through single transactions.

use crate::progression::registry::RegistryError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod character_service;
pub mod equipment_service;
pub mod progression_service;

pub type EngineResult<T> = Result<T, EngineError>;

/// Service-level error union surfaced to callers.
#[derive(Debug)]
pub enum EngineError {
    Repo(RepoError),
    Registry(RegistryError),
    InsufficientCoins { required: i64, available: i64 },
    AlreadyOwned(String),
    NotOwned(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Registry(err) => write!(f, "{err}"),
            Self::InsufficientCoins {
                required,
                available,
            } => write!(f, "insufficient coins: need {required}, have {available}"),
            Self::AlreadyOwned(id) => write!(f, "equipment already owned: {id}"),
            Self::NotOwned(id) => write!(f, "equipment not owned: {id}"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Registry(err) => Some(err),
            Self::InsufficientCoins { .. } | Self::AlreadyOwned(_) | Self::NotOwned(_) => None,
        }
    }
}

impl From<RepoError> for EngineError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<RegistryError> for EngineError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}
