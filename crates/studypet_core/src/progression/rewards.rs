//! Pure reward calculation rules.
//!
//! # Responsibility
//! - Map study minutes to experience and base coins.
//! - Map accumulated experience to level and level to the next threshold.
//! - Map level to the built-in character appearance.
//!
//! # Invariants
//! - `level_for` is non-decreasing and never returns less than 1.
//! - `level_for(next_level_threshold(l)) == l + 1` for every level.
//! - Level boundaries (100, 400, 900, ...) are exact; level math stays in
//!   integers so float rounding can never shift a boundary.

use serde::{Deserialize, Serialize};

/// Experience granted per study minute.
const EXPERIENCE_PER_MINUTE: f64 = 10.0;

/// Coin bonus tiers: reaching each minute threshold adds its bonus on top
/// of the previous tiers.
const COIN_BONUS_TIERS: &[(f64, i64)] = &[(30.0, 10), (60.0, 20)];

/// Converts study minutes to experience points: `floor(minutes * 10)`.
pub fn experience_for(minutes: f64) -> i64 {
    if minutes <= 0.0 {
        return 0;
    }
    (minutes * EXPERIENCE_PER_MINUTE).floor() as i64
}

/// Converts accumulated experience to a level.
///
/// Level 1 covers 0-99 exp, level 2 covers 100-399, level 3 covers
/// 400-899, and so on: `floor(sqrt(exp / 100)) + 1`.
pub fn level_for(experience: i64) -> i64 {
    if experience < 100 {
        return 1;
    }
    // isqrt(exp / 100) equals floor(sqrt(exp / 100.0)): no perfect square
    // lies strictly between the integer quotient and the real quotient.
    ((experience as u64) / 100).isqrt() as i64 + 1
}

/// Experience at which `level_for` first returns `level + 1`.
pub fn next_level_threshold(level: i64) -> i64 {
    level * level * 100
}

/// Converts study minutes to base coins: one per full minute, plus
/// stacking tier bonuses (+10 from 30 minutes, +20 more from 60 minutes).
pub fn coins_for(minutes: f64) -> i64 {
    if minutes <= 0.0 {
        return 0;
    }
    let mut coins = minutes.floor() as i64;
    for (threshold, bonus) in COIN_BONUS_TIERS {
        if minutes >= *threshold {
            coins += bonus;
        }
    }
    coins
}

/// Character body size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterSize {
    Small,
    Medium,
    Large,
}

/// Level-derived visual baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Appearance {
    pub color: &'static str,
    pub size: CharacterSize,
    pub accessories: &'static [&'static str],
}

const APPEARANCES: [Appearance; 5] = [
    Appearance {
        color: "#8B4513",
        size: CharacterSize::Small,
        accessories: &[],
    },
    Appearance {
        color: "#32CD32",
        size: CharacterSize::Small,
        accessories: &["hat"],
    },
    Appearance {
        color: "#4169E1",
        size: CharacterSize::Medium,
        accessories: &["hat", "book"],
    },
    Appearance {
        color: "#FF6347",
        size: CharacterSize::Medium,
        accessories: &["hat", "book", "glasses"],
    },
    Appearance {
        color: "#FFD700",
        size: CharacterSize::Large,
        accessories: &["crown", "book", "glasses", "robe"],
    },
];

/// Looks up the appearance for a level.
///
/// Appearance plateaus at level 5; beyond that only equipped items add
/// further accessories.
pub fn appearance_for(level: i64) -> Appearance {
    let index = level.clamp(1, APPEARANCES.len() as i64) as usize - 1;
    APPEARANCES[index]
}

#[cfg(test)]
mod tests {
    use super::{
        appearance_for, coins_for, experience_for, level_for, next_level_threshold, CharacterSize,
    };

    #[test]
    fn experience_scales_linearly_with_floor() {
        assert_eq!(experience_for(0.0), 0);
        assert_eq!(experience_for(1.5), 15);
        assert_eq!(experience_for(10.0), 100);
        assert_eq!(experience_for(-3.0), 0);
    }

    #[test]
    fn level_boundaries_are_exact() {
        assert_eq!(level_for(0), 1);
        assert_eq!(level_for(99), 1);
        assert_eq!(level_for(100), 2);
        assert_eq!(level_for(399), 2);
        assert_eq!(level_for(400), 3);
        assert_eq!(level_for(899), 3);
        assert_eq!(level_for(900), 4);
    }

    #[test]
    fn level_is_at_least_one_and_non_decreasing() {
        let mut previous = 0;
        for experience in 0..5_000 {
            let level = level_for(experience);
            assert!(level >= 1);
            assert!(level >= previous, "level regressed at exp {experience}");
            previous = level;
        }
    }

    #[test]
    fn thresholds_cross_check_with_level_for() {
        for level in 1..=20 {
            let threshold = next_level_threshold(level);
            assert_eq!(level_for(threshold), level + 1, "at threshold {threshold}");
            assert_eq!(level_for(threshold - 1), level, "below threshold {threshold}");
        }
    }

    #[test]
    fn coin_tiers_stack() {
        assert_eq!(coins_for(10.0), 10);
        assert_eq!(coins_for(29.9), 29);
        assert_eq!(coins_for(30.0), 40);
        assert_eq!(coins_for(59.9), 69);
        assert_eq!(coins_for(60.0), 90);
        assert_eq!(coins_for(90.0), 120);
        assert_eq!(coins_for(0.0), 0);
    }

    #[test]
    fn appearance_progresses_then_plateaus_at_five() {
        assert_eq!(appearance_for(1).color, "#8B4513");
        assert_eq!(appearance_for(1).size, CharacterSize::Small);
        assert!(appearance_for(1).accessories.is_empty());

        assert_eq!(appearance_for(3).color, "#4169E1");
        assert_eq!(appearance_for(3).accessories, &["hat", "book"]);

        let five = appearance_for(5);
        assert_eq!(five.color, "#FFD700");
        assert_eq!(five.size, CharacterSize::Large);
        assert_eq!(five.accessories, &["crown", "book", "glasses", "robe"]);

        assert_eq!(appearance_for(12), five);
    }
}
