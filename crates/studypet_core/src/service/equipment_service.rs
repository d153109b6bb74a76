//! Equipment shop use-case service.
//!
//! # Responsibility
//! - Expose catalog browsing, purchase and equip/unequip flows.
//! - Map repository outcomes to shop-level errors.
//!
//! # Invariants
//! - A purchase debits coins, grants ownership and appends a ledger entry
//!   atomically; a character can never spend below zero.
//! - Equipping a color skin replaces any previously equipped color.

use crate::model::character::CharacterId;
use crate::model::equipment::{CoinTransaction, Equipment, OwnedEquipment};
use crate::repo::character_repo::require_character;
use crate::repo::equipment_repo::{EquipmentRepository, SqliteEquipmentRepository};
use crate::repo::ledger_repo::{LedgerRepository, SqliteLedgerRepository};
use crate::repo::RepoError;
use crate::service::{EngineError, EngineResult};
use log::info;
use rusqlite::Connection;

/// Outcome of a completed purchase.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PurchaseSummary {
    pub equipment: Equipment,
    pub coins_remaining: i64,
}

/// Use-case service for the equipment shop.
pub struct EquipmentService<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> EquipmentService<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    /// Seeds the built-in catalog; safe to call on every startup.
    pub fn seed_catalog(&mut self) -> EngineResult<usize> {
        let inserted = SqliteEquipmentRepository::new(self.conn).seed_default_catalog()?;
        if inserted > 0 {
            info!(
                "event=catalog_seed module=equipment status=ok inserted={}",
                inserted
            );
        }
        Ok(inserted)
    }

    /// Full catalog, id ascending.
    pub fn catalog(&mut self) -> EngineResult<Vec<Equipment>> {
        Ok(SqliteEquipmentRepository::new(self.conn).list_catalog()?)
    }

    /// Ownership edges for one character.
    pub fn owned(&mut self, character: CharacterId) -> EngineResult<Vec<OwnedEquipment>> {
        require_character(self.conn, character)?;
        Ok(SqliteEquipmentRepository::new(self.conn).list_owned(character)?)
    }

    /// Coin ledger for one character, newest first.
    pub fn coin_history(&mut self, character: CharacterId) -> EngineResult<Vec<CoinTransaction>> {
        require_character(self.conn, character)?;
        Ok(SqliteLedgerRepository::new(self.conn).list_for_character(character)?)
    }

    /// Buys a catalog item for a character.
    pub fn purchase(
        &mut self,
        character: CharacterId,
        equipment_id: &str,
        now_ms: i64,
    ) -> EngineResult<PurchaseSummary> {
        let record = require_character(self.conn, character)?;

        let mut repo = SqliteEquipmentRepository::new(self.conn);
        let item = repo
            .get_equipment(equipment_id)?
            .ok_or_else(|| RepoError::EquipmentNotFound(equipment_id.to_string()))?;
        if repo.owns(character, equipment_id)? {
            return Err(EngineError::AlreadyOwned(equipment_id.to_string()));
        }

        let Some(coins_remaining) = repo.record_purchase(character, &item, now_ms)? else {
            return Err(EngineError::InsufficientCoins {
                required: item.price,
                available: record.coins,
            });
        };

        info!(
            "event=purchase module=equipment status=ok character={} equipment={} price={} coins_remaining={}",
            character, item.id, item.price, coins_remaining
        );
        Ok(PurchaseSummary {
            equipment: item,
            coins_remaining,
        })
    }

    /// Equips an owned item.
    pub fn equip(&mut self, character: CharacterId, equipment_id: &str) -> EngineResult<()> {
        self.toggle(character, equipment_id, true)
    }

    /// Unequips an owned item.
    pub fn unequip(&mut self, character: CharacterId, equipment_id: &str) -> EngineResult<()> {
        self.toggle(character, equipment_id, false)
    }

    fn toggle(
        &mut self,
        character: CharacterId,
        equipment_id: &str,
        equipped: bool,
    ) -> EngineResult<()> {
        require_character(self.conn, character)?;

        let mut repo = SqliteEquipmentRepository::new(self.conn);
        let item = repo
            .get_equipment(equipment_id)?
            .ok_or_else(|| RepoError::EquipmentNotFound(equipment_id.to_string()))?;
        if !repo.owns(character, equipment_id)? {
            return Err(EngineError::NotOwned(equipment_id.to_string()));
        }

        repo.set_equipped(character, &item, equipped)?;
        info!(
            "event=equip_toggle module=equipment status=ok character={} equipment={} equipped={}",
            character, item.id, equipped
        );
        Ok(())
    }
}
