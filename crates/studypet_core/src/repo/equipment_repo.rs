//! Equipment catalog/ownership repository and shop transactions.
//!
//! # Responsibility
//! - Seed and read the immutable equipment catalog.
//! - Own the multi-table purchase and equip transactions.
//!
//! # Invariants
//! - `record_purchase` keeps coins, ownership and ledger consistent in one
//!   transaction; the coin decrement is guarded so balances never go
//!   negative.
//! - `set_equipped` keeps at most one color equipped per character and
//!   mirrors the equipped color into `characters.current_color`.
//! - Equipped-id queries return equipment id ascending, the deterministic
//!   order bonus resolution relies on.

use crate::model::character::{CharacterId, BASE_COLOR};
use crate::model::equipment::{
    default_catalog, CoinTransaction, Equipment, EquipmentCategory, OwnedEquipment,
};
use crate::repo::ledger_repo::append_transaction;
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const EQUIPMENT_SELECT_SQL: &str = "SELECT
    id,
    name,
    category,
    price,
    description,
    color_code
FROM equipment";

/// Repository interface for the equipment catalog and ownership edges.
pub trait EquipmentRepository {
    /// Inserts the built-in catalog, skipping rows that already exist.
    fn seed_default_catalog(&mut self) -> RepoResult<usize>;
    fn get_equipment(&self, id: &str) -> RepoResult<Option<Equipment>>;
    /// Full catalog, id ascending.
    fn list_catalog(&self) -> RepoResult<Vec<Equipment>>;
    /// Ownership edges for one character, equipment id ascending.
    fn list_owned(&self, character: CharacterId) -> RepoResult<Vec<OwnedEquipment>>;
    fn owns(&self, character: CharacterId, equipment_id: &str) -> RepoResult<bool>;
    /// Equipped accessory ids for one character, id ascending.
    fn equipped_accessory_ids(&self, character: CharacterId) -> RepoResult<Vec<String>>;
    /// Applies a purchase atomically: guarded coin decrement, ownership
    /// insert, ledger append. Returns the new balance, or `None` when the
    /// balance guard rejected the decrement (insufficient coins).
    fn record_purchase(
        &mut self,
        character: CharacterId,
        item: &Equipment,
        now_ms: i64,
    ) -> RepoResult<Option<i64>>;
    /// Toggles the equipped flag on an owned item, enforcing color
    /// exclusivity and maintaining `characters.current_color`.
    fn set_equipped(
        &mut self,
        character: CharacterId,
        item: &Equipment,
        equipped: bool,
    ) -> RepoResult<()>;
}

/// SQLite-backed equipment repository.
///
/// Holds a mutable connection because purchase/equip are multi-table
/// transactions.
pub struct SqliteEquipmentRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteEquipmentRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }
}

impl EquipmentRepository for SqliteEquipmentRepository<'_> {
    fn seed_default_catalog(&mut self) -> RepoResult<usize> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for item in default_catalog() {
            inserted += tx.execute(
                "INSERT OR IGNORE INTO equipment (
                    id,
                    name,
                    category,
                    price,
                    description,
                    color_code
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    item.id.as_str(),
                    item.name.as_str(),
                    category_to_db(item.category),
                    item.price,
                    item.description.as_deref(),
                    item.color_code.as_deref(),
                ],
            )?;
        }
        tx.commit()?;
        Ok(inserted)
    }

    fn get_equipment(&self, id: &str) -> RepoResult<Option<Equipment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EQUIPMENT_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_equipment_row(row)?));
        }

        Ok(None)
    }

    fn list_catalog(&self) -> RepoResult<Vec<Equipment>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{EQUIPMENT_SELECT_SQL} ORDER BY id ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut catalog = Vec::new();
        while let Some(row) = rows.next()? {
            catalog.push(parse_equipment_row(row)?);
        }

        Ok(catalog)
    }

    fn list_owned(&self, character: CharacterId) -> RepoResult<Vec<OwnedEquipment>> {
        let mut stmt = self.conn.prepare(
            "SELECT character_uuid, equipment_id, is_equipped, purchased_at
             FROM character_equipment
             WHERE character_uuid = ?1
             ORDER BY equipment_id ASC;",
        )?;

        let mut rows = stmt.query([character.to_string()])?;
        let mut owned = Vec::new();
        while let Some(row) = rows.next()? {
            owned.push(parse_owned_row(row)?);
        }

        Ok(owned)
    }

    fn owns(&self, character: CharacterId, equipment_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM character_equipment
                WHERE character_uuid = ?1
                  AND equipment_id = ?2
            );",
            params![character.to_string(), equipment_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn equipped_accessory_ids(&self, character: CharacterId) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT ce.equipment_id
             FROM character_equipment ce
             INNER JOIN equipment e ON e.id = ce.equipment_id
             WHERE ce.character_uuid = ?1
               AND ce.is_equipped = 1
               AND e.category = 'accessory'
             ORDER BY ce.equipment_id ASC;",
        )?;

        let mut rows = stmt.query([character.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            ids.push(row.get(0)?);
        }

        Ok(ids)
    }

    fn record_purchase(
        &mut self,
        character: CharacterId,
        item: &Equipment,
        now_ms: i64,
    ) -> RepoResult<Option<i64>> {
        let tx = self.conn.transaction()?;

        let new_balance: Option<i64> = tx
            .query_row(
                "UPDATE characters
                 SET coins = coins - ?1
                 WHERE uuid = ?2
                   AND coins >= ?1
                 RETURNING coins;",
                params![item.price, character.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let Some(new_balance) = new_balance else {
            return Ok(None);
        };

        tx.execute(
            "INSERT INTO character_equipment (
                character_uuid,
                equipment_id,
                is_equipped,
                purchased_at
            ) VALUES (?1, ?2, 0, ?3);",
            params![character.to_string(), item.id.as_str(), now_ms],
        )?;

        let entry = CoinTransaction::spent_on_purchase(character, item.price, &item.id, now_ms);
        append_transaction(&tx, &entry)?;

        tx.commit()?;
        Ok(Some(new_balance))
    }

    fn set_equipped(
        &mut self,
        character: CharacterId,
        item: &Equipment,
        equipped: bool,
    ) -> RepoResult<()> {
        let tx = self.conn.transaction()?;

        if equipped && item.category == EquipmentCategory::Color {
            // Equipping a color silently unequips the previous one.
            tx.execute(
                "UPDATE character_equipment
                 SET is_equipped = 0
                 WHERE character_uuid = ?1
                   AND is_equipped = 1
                   AND equipment_id IN (
                       SELECT id FROM equipment WHERE category = 'color'
                   );",
                [character.to_string()],
            )?;
        }

        let changed = tx.execute(
            "UPDATE character_equipment
             SET is_equipped = ?1
             WHERE character_uuid = ?2
               AND equipment_id = ?3;",
            params![
                if equipped { 1 } else { 0 },
                character.to_string(),
                item.id.as_str(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::EquipmentNotFound(item.id.clone()));
        }

        if item.category == EquipmentCategory::Color {
            let color = if equipped {
                item.color_code.as_deref().ok_or_else(|| {
                    RepoError::InvalidData(format!("color item `{}` has no color code", item.id))
                })?
            } else {
                BASE_COLOR
            };
            tx.execute(
                "UPDATE characters SET current_color = ?1 WHERE uuid = ?2;",
                params![color, character.to_string()],
            )?;
        }

        tx.commit()?;
        Ok(())
    }
}

fn parse_equipment_row(row: &Row<'_>) -> RepoResult<Equipment> {
    let category_text: String = row.get("category")?;
    let category = parse_category(&category_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid category `{category_text}` in equipment.category"
        ))
    })?;

    Ok(Equipment {
        id: row.get("id")?,
        name: row.get("name")?,
        category,
        price: row.get("price")?,
        description: row.get("description")?,
        color_code: row.get("color_code")?,
    })
}

fn parse_owned_row(row: &Row<'_>) -> RepoResult<OwnedEquipment> {
    let character_text: String = row.get("character_uuid")?;
    let character_uuid = Uuid::parse_str(&character_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{character_text}` in character_equipment.character_uuid"
        ))
    })?;

    let is_equipped = match row.get::<_, i64>("is_equipped")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_equipped value `{other}` in character_equipment.is_equipped"
            )));
        }
    };

    Ok(OwnedEquipment {
        character_uuid,
        equipment_id: row.get("equipment_id")?,
        is_equipped,
        purchased_at: row.get("purchased_at")?,
    })
}

fn category_to_db(category: EquipmentCategory) -> &'static str {
    match category {
        EquipmentCategory::Accessory => "accessory",
        EquipmentCategory::Color => "color",
    }
}

fn parse_category(value: &str) -> Option<EquipmentCategory> {
    match value {
        "accessory" => Some(EquipmentCategory::Accessory),
        "color" => Some(EquipmentCategory::Color),
        _ => None,
    }
}
