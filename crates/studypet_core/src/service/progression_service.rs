//! Progression orchestration: timers, reward application, appearance and
//! study statistics.
//!
//! # Responsibility
//! - Drive the session lifecycle (start -> running -> finalizing ->
//!   closed) across the registry and the persistent store.
//! - Apply the reward delta for a stopped session as one transaction.
//!
//! # Invariants
//! - Rewards for a session are applied at most once: the registry claim is
//!   exclusive, and the entry is removed only after the transaction
//!   commits.
//! - Persistence retries reuse the values computed at claim time; the
//!   elapsed duration is never recomputed from a later "now".
//! - `characters.level` is rewritten from the post-update experience
//!   inside the same transaction.

use crate::model::character::CharacterId;
use crate::model::equipment::CoinTransaction;
use crate::model::session::{SessionId, StudySession};
use crate::progression::bonus::{resolve_bonus, EquipmentBonus};
use crate::progression::registry::SessionRegistry;
use crate::progression::rewards::{
    appearance_for, coins_for, experience_for, level_for, next_level_threshold, CharacterSize,
};
use crate::repo::character_repo::require_character;
use crate::repo::equipment_repo::{EquipmentRepository, SqliteEquipmentRepository};
use crate::repo::ledger_repo::append_transaction;
use crate::repo::session_repo::{SessionRepository, SqliteSessionRepository};
use crate::repo::{RepoError, RepoResult};
use crate::service::EngineResult;
use chrono::{DateTime, Datelike, NaiveTime, Utc};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension};

const MS_PER_MINUTE: f64 = 60_000.0;
const MS_PER_DAY: i64 = 86_400_000;

/// Attempts per stop before a persistence failure is surfaced. Retries
/// reuse the already-computed reward values.
const MAX_APPLY_ATTEMPTS: u32 = 3;

/// Reward summary returned by `stop_session`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StopSummary {
    pub duration_minutes: f64,
    pub experience_gained: i64,
    pub coins_gained: i64,
    pub level_up: bool,
    pub new_level: i64,
    pub total_experience: i64,
    pub total_coins: i64,
    pub equipment_bonus: EquipmentBonus,
}

/// Character look combining level baseline and equipped items.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AppearanceView {
    /// Equipped color skin, or the level color when none is equipped.
    pub color: String,
    pub size: CharacterSize,
    /// Level accessories followed by equipped ones, deduplicated.
    pub accessories: Vec<String>,
    /// The level-table accessories alone.
    pub level_accessories: Vec<String>,
    pub next_level_exp: i64,
    pub exp_to_next_level: i64,
    pub equipment_bonus: EquipmentBonus,
}

/// Aggregated study statistics over finished sessions.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StudyStats {
    pub today_study_minutes: f64,
    pub week_study_minutes: f64,
    pub total_sessions: i64,
}

struct AppliedReward {
    experience: i64,
    coins: i64,
    level: i64,
}

/// Orchestrator for session start/stop and progression reads.
///
/// Owns a mutable connection (reward application is a multi-table
/// transaction) and borrows the shared active-timer registry.
pub struct ProgressionService<'conn, 'reg> {
    conn: &'conn mut Connection,
    registry: &'reg SessionRegistry,
}

impl<'conn, 'reg> ProgressionService<'conn, 'reg> {
    pub fn new(conn: &'conn mut Connection, registry: &'reg SessionRegistry) -> Self {
        Self { conn, registry }
    }

    /// Starts a timed study session for a character.
    ///
    /// Persists a session stub with no end time and registers the running
    /// timer. The registry reservation is rolled back if the stub insert
    /// fails, so the two stay consistent.
    pub fn start_session(
        &mut self,
        character: CharacterId,
        subject: Option<&str>,
        now_ms: i64,
    ) -> EngineResult<SessionId> {
        require_character(self.conn, character)?;

        let session = StudySession::start(character, subject, now_ms);
        self.registry.register(session.uuid, character, now_ms)?;

        if let Err(err) = SqliteSessionRepository::new(self.conn).create_session(&session) {
            self.registry.remove(session.uuid);
            return Err(err.into());
        }

        info!(
            "event=session_start module=progression status=ok session={} character={}",
            session.uuid, character
        );
        Ok(session.uuid)
    }

    /// Stops a running session and applies its rewards.
    ///
    /// Fails with a session-not-found error when the timer is absent,
    /// already stopped, being stopped concurrently, or was lost to a
    /// process restart. The registry entry is removed only after the
    /// reward transaction commits; on failure the claim is released so the
    /// caller can retry the stop.
    pub fn stop_session(&mut self, session: SessionId, now_ms: i64) -> EngineResult<StopSummary> {
        let timer = self.registry.claim(session)?;

        let result = self.finalize_claimed(session, timer.character_uuid, timer.started_at, now_ms);
        match &result {
            Ok(_) => self.registry.remove(session),
            Err(err) => {
                warn!(
                    "event=session_stop module=progression status=error session={} error={}",
                    session, err
                );
                self.registry.release(session);
            }
        }
        result
    }

    /// Returns the combined level/equipment look for a character.
    pub fn appearance(&mut self, character: CharacterId) -> EngineResult<AppearanceView> {
        let record = require_character(self.conn, character)?;
        let equipped = SqliteEquipmentRepository::new(self.conn).equipped_accessory_ids(character)?;
        let bonus = resolve_bonus(&equipped);

        let base = appearance_for(record.level);
        let level_accessories: Vec<String> =
            base.accessories.iter().map(|name| name.to_string()).collect();
        let mut accessories = level_accessories.clone();
        for id in &equipped {
            if !accessories.contains(id) {
                accessories.push(id.clone());
            }
        }

        let color = if record.has_color_skin() {
            record.current_color.clone()
        } else {
            base.color.to_string()
        };

        let next_level_exp = next_level_threshold(record.level);
        Ok(AppearanceView {
            color,
            size: base.size,
            accessories,
            level_accessories,
            next_level_exp,
            exp_to_next_level: next_level_exp - record.experience,
            equipment_bonus: bonus,
        })
    }

    /// Aggregates finished-session statistics for a character.
    ///
    /// "Today" and "week" windows use UTC calendar days with weeks
    /// starting on Monday.
    pub fn stats(&mut self, character: CharacterId, now_ms: i64) -> EngineResult<StudyStats> {
        require_character(self.conn, character)?;

        let day_start = utc_day_start(now_ms);
        let week_start = utc_week_start(now_ms);

        let sessions = SqliteSessionRepository::new(self.conn);
        Ok(StudyStats {
            today_study_minutes: sessions.study_minutes_since(character, day_start)?,
            week_study_minutes: sessions.study_minutes_since(character, week_start)?,
            total_sessions: sessions.finished_count(character)?,
        })
    }

    fn finalize_claimed(
        &mut self,
        session: SessionId,
        character: CharacterId,
        started_at: i64,
        now_ms: i64,
    ) -> EngineResult<StopSummary> {
        let duration_minutes = (now_ms - started_at).max(0) as f64 / MS_PER_MINUTE;

        let record = require_character(self.conn, character)?;
        let equipped = SqliteEquipmentRepository::new(self.conn).equipped_accessory_ids(character)?;
        let bonus = resolve_bonus(&equipped);

        let experience_gained =
            EquipmentBonus::scale(experience_for(duration_minutes), bonus.experience_multiplier);
        let coins_gained =
            EquipmentBonus::scale(coins_for(duration_minutes), bonus.coin_multiplier);
        let ledger_entry =
            CoinTransaction::earned_from_study(character, coins_gained, session, now_ms);

        let mut attempt = 0;
        let applied = loop {
            attempt += 1;
            match self.apply_reward(
                session,
                character,
                duration_minutes,
                experience_gained,
                coins_gained,
                &ledger_entry,
                now_ms,
            ) {
                Ok(applied) => break applied,
                Err(err) if err.is_retryable() && attempt < MAX_APPLY_ATTEMPTS => {
                    warn!(
                        "event=reward_apply module=progression status=retry attempt={} session={} error={}",
                        attempt, session, err
                    );
                }
                Err(err) => return Err(err.into()),
            }
        };

        let level_up = applied.level > record.level;
        info!(
            "event=session_stop module=progression status=ok session={} character={} duration_min={:.2} exp_gained={} coins_gained={} new_level={} level_up={}",
            session, character, duration_minutes, experience_gained, coins_gained, applied.level, level_up
        );

        Ok(StopSummary {
            duration_minutes,
            experience_gained,
            coins_gained,
            level_up,
            new_level: applied.level,
            total_experience: applied.experience,
            total_coins: applied.coins,
            equipment_bonus: bonus,
        })
    }

    /// Applies one computed reward delta in a single transaction:
    /// character counters, derived level, ledger append and session
    /// finalization commit together or not at all.
    fn apply_reward(
        &mut self,
        session: SessionId,
        character: CharacterId,
        duration_minutes: f64,
        experience_gained: i64,
        coins_gained: i64,
        ledger_entry: &CoinTransaction,
        now_ms: i64,
    ) -> RepoResult<AppliedReward> {
        let tx = self.conn.transaction()?;

        // The stub row is the gate: a session that is already finalized or
        // gone must never earn a second reward.
        let finalized = tx.execute(
            "UPDATE study_sessions
             SET duration_minutes = ?1,
                 ended_at = ?2
             WHERE uuid = ?3
               AND ended_at IS NULL;",
            params![duration_minutes, now_ms, session.to_string()],
        )?;
        if finalized == 0 {
            return Err(RepoError::SessionNotFound(session));
        }

        let updated: Option<(i64, i64)> = tx
            .query_row(
                "UPDATE characters
                 SET total_study_minutes = total_study_minutes + ?1,
                     experience = experience + ?2,
                     coins = coins + ?3
                 WHERE uuid = ?4
                 RETURNING experience, coins;",
                params![
                    duration_minutes,
                    experience_gained,
                    coins_gained,
                    character.to_string(),
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((experience, coins)) = updated else {
            return Err(RepoError::CharacterNotFound(character));
        };

        let level = level_for(experience);
        tx.execute(
            "UPDATE characters SET level = ?1 WHERE uuid = ?2;",
            params![level, character.to_string()],
        )?;

        append_transaction(&tx, ledger_entry)?;

        tx.commit()?;
        Ok(AppliedReward {
            experience,
            coins,
            level,
        })
    }
}

fn utc_day_start(now_ms: i64) -> i64 {
    match DateTime::<Utc>::from_timestamp_millis(now_ms) {
        Some(now) => now
            .date_naive()
            .and_time(NaiveTime::MIN)
            .and_utc()
            .timestamp_millis(),
        None => 0,
    }
}

fn utc_week_start(now_ms: i64) -> i64 {
    match DateTime::<Utc>::from_timestamp_millis(now_ms) {
        Some(now) => {
            let days_into_week = i64::from(now.weekday().num_days_from_monday());
            utc_day_start(now_ms) - days_into_week * MS_PER_DAY
        }
        None => 0,
    }
}
