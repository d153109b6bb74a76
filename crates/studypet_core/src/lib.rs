//! Core domain logic for StudyPet.
//! This crate is the single source of truth for progression invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod progression;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::character::{Character, CharacterId, BASE_COLOR};
pub use model::equipment::{
    default_catalog, CoinTransaction, Equipment, EquipmentCategory, OwnedEquipment,
    TransactionType,
};
pub use model::session::{SessionId, StudySession};
pub use progression::bonus::{resolve_bonus, EquipmentBonus};
pub use progression::registry::{ActiveTimer, RegistryError, SessionRegistry};
pub use progression::rewards::{
    appearance_for, coins_for, experience_for, level_for, next_level_threshold, Appearance,
    CharacterSize,
};
pub use repo::character_repo::{CharacterRepository, SqliteCharacterRepository};
pub use repo::equipment_repo::{EquipmentRepository, SqliteEquipmentRepository};
pub use repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
pub use repo::session_repo::{SessionRepository, SqliteSessionRepository};
pub use repo::{RepoError, RepoResult};
pub use service::character_service::CharacterService;
pub use service::equipment_service::{EquipmentService, PurchaseSummary};
pub use service::progression_service::{
    AppearanceView, ProgressionService, StopSummary, StudyStats,
};
pub use service::{EngineError, EngineResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
