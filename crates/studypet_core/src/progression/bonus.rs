//! Equipment bonus resolution.
//!
//! # Responsibility
//! - Fold the equipped accessory set into one combined reward bonus.
//!
//! # Invariants
//! - Multipliers combine multiplicatively across items; the fold is
//!   associative and order-independent for the numeric result.
//! - Effect names keep the input iteration order; callers that need a
//!   stable order must pass a deterministically ordered id list.
//! - Unrecognized ids and color skins contribute nothing.

use serde::{Deserialize, Serialize};

struct BonusContribution {
    id: &'static str,
    experience: f64,
    coins: f64,
    effects: &'static [&'static str],
}

/// Per-accessory reward contributions. Ids match the equipment catalog;
/// color skins are intentionally absent.
const ACCESSORY_BONUSES: &[BonusContribution] = &[
    BonusContribution {
        id: "crown",
        experience: 1.20,
        coins: 1.0,
        effects: &["王者の威厳"],
    },
    BonusContribution {
        id: "book",
        experience: 1.05,
        coins: 1.0,
        effects: &["知識の蓄積"],
    },
    BonusContribution {
        id: "glasses",
        experience: 1.10,
        coins: 1.0,
        effects: &["集中力向上"],
    },
    BonusContribution {
        id: "hat",
        experience: 1.0,
        coins: 1.10,
        effects: &["幸運の帽子"],
    },
    BonusContribution {
        id: "robe",
        experience: 1.05,
        coins: 1.05,
        effects: &["賢者の風格"],
    },
];

/// Combined multiplicative reward bonus from equipped accessories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentBonus {
    pub experience_multiplier: f64,
    pub coin_multiplier: f64,
    /// Named effects of every contributing item, in input order.
    pub effects: Vec<String>,
}

impl EquipmentBonus {
    /// The no-equipment bonus: multipliers of 1.0 and no effects.
    pub fn neutral() -> Self {
        Self {
            experience_multiplier: 1.0,
            coin_multiplier: 1.0,
            effects: Vec::new(),
        }
    }

    /// Scales a base reward by a multiplier, truncating toward zero.
    pub fn scale(base: i64, multiplier: f64) -> i64 {
        (base as f64 * multiplier).floor() as i64
    }
}

impl Default for EquipmentBonus {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Resolves the combined bonus for a list of equipped item ids.
pub fn resolve_bonus<S: AsRef<str>>(equipped_ids: &[S]) -> EquipmentBonus {
    let mut bonus = EquipmentBonus::neutral();
    for id in equipped_ids {
        let Some(contribution) = lookup(id.as_ref()) else {
            continue;
        };
        bonus.experience_multiplier *= contribution.experience;
        bonus.coin_multiplier *= contribution.coins;
        bonus
            .effects
            .extend(contribution.effects.iter().map(|effect| effect.to_string()));
    }
    bonus
}

fn lookup(id: &str) -> Option<&'static BonusContribution> {
    ACCESSORY_BONUSES
        .iter()
        .find(|contribution| contribution.id == id)
}
