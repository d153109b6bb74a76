//! Equipment catalog, ownership and coin ledger models.
//!
//! # Responsibility
//! - Define the immutable equipment catalog shape and the built-in seed
//!   data.
//! - Define the per-character ownership edge and the append-only coin
//!   transaction record.
//!
//! # Invariants
//! - Catalog rows are immutable reference data once seeded.
//! - At most one `Color` item is equipped per character at any time.
//! - `CoinTransaction` rows are never mutated after creation; the sum of a
//!   character's amounts always reconciles with `Character::coins`.

use crate::model::character::CharacterId;
use crate::model::session::SessionId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Catalog category for an equipment item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    /// Stat-bearing cosmetic accessory; any number may be equipped.
    Accessory,
    /// Color skin; mutually exclusive, no stat bonus.
    Color,
}

/// One purchasable catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    /// Catalog identifier, e.g. `crown` or `color_gold`.
    pub id: String,
    /// Display name.
    pub name: String,
    pub category: EquipmentCategory,
    /// Price in coins.
    pub price: i64,
    pub description: Option<String>,
    /// Hex color applied to the character. Only set for `Color` items.
    pub color_code: Option<String>,
}

/// Ownership edge between a character and a catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedEquipment {
    pub character_uuid: CharacterId,
    pub equipment_id: String,
    pub is_equipped: bool,
    /// Purchase instant in Unix epoch milliseconds.
    pub purchased_at: i64,
}

/// Direction of a coin ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Earned,
    Spent,
}

/// Append-only coin ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinTransaction {
    pub uuid: Uuid,
    pub character_uuid: CharacterId,
    /// Signed amount: positive for earnings, negative for spending.
    pub amount: i64,
    pub transaction_type: TransactionType,
    /// Origin tag, e.g. `study` or `purchase`.
    pub source: String,
    /// Originating session for study rewards.
    pub study_session_uuid: Option<SessionId>,
    /// Purchased item for shop spending.
    pub equipment_id: Option<String>,
    /// Creation instant in Unix epoch milliseconds.
    pub created_at: i64,
}

impl CoinTransaction {
    /// Builds a study-reward earning entry.
    pub fn earned_from_study(
        character_uuid: CharacterId,
        amount: i64,
        session_uuid: SessionId,
        now_ms: i64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            character_uuid,
            amount,
            transaction_type: TransactionType::Earned,
            source: "study".to_string(),
            study_session_uuid: Some(session_uuid),
            equipment_id: None,
            created_at: now_ms,
        }
    }

    /// Builds a shop-purchase spending entry. `price` must be positive;
    /// the stored amount is its negation.
    pub fn spent_on_purchase(
        character_uuid: CharacterId,
        price: i64,
        equipment_id: &str,
        now_ms: i64,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            character_uuid,
            amount: -price,
            transaction_type: TransactionType::Spent,
            source: "purchase".to_string(),
            study_session_uuid: None,
            equipment_id: Some(equipment_id.to_string()),
            created_at: now_ms,
        }
    }
}

/// Built-in catalog seeded into every database.
///
/// Accessory ids line up with the bonus table in `progression::bonus` and
/// with the level-appearance accessory names.
pub fn default_catalog() -> Vec<Equipment> {
    vec![
        accessory("hat", "幸運の帽子", 100, "コイン獲得が少し増える帽子"),
        accessory("book", "魔法の本", 300, "経験値獲得が少し増える本"),
        accessory("glasses", "知恵の眼鏡", 400, "経験値獲得が増える眼鏡"),
        accessory("crown", "王者の王冠", 800, "経験値獲得が大きく増える王冠"),
        accessory("robe", "賢者のローブ", 600, "経験値とコイン獲得が増えるローブ"),
        color("color_green", "若葉", 150, "#32CD32"),
        color("color_blue", "蒼空", 150, "#4169E1"),
        color("color_red", "紅蓮", 200, "#FF6347"),
        color("color_purple", "紫苑", 250, "#9370DB"),
        color("color_gold", "黄金", 500, "#FFD700"),
    ]
}

fn accessory(id: &str, name: &str, price: i64, description: &str) -> Equipment {
    Equipment {
        id: id.to_string(),
        name: name.to_string(),
        category: EquipmentCategory::Accessory,
        price,
        description: Some(description.to_string()),
        color_code: None,
    }
}

fn color(id: &str, name: &str, price: i64, code: &str) -> Equipment {
    Equipment {
        id: id.to_string(),
        name: name.to_string(),
        category: EquipmentCategory::Color,
        price,
        description: Some(format!("{name}のカラーリング")),
        color_code: Some(code.to_string()),
    }
}
