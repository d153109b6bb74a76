//! Study session repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist session stubs at timer start and expose finished-session
//!   queries for statistics.
//!
//! # Invariants
//! - Session finalization happens only inside the reward transaction (see
//!   `service::progression_service`), never through this trait.
//! - Statistics queries count only sessions with `ended_at` set.

use crate::model::character::CharacterId;
use crate::model::session::{SessionId, StudySession};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const SESSION_SELECT_SQL: &str = "SELECT
    uuid,
    character_uuid,
    subject,
    duration_minutes,
    started_at,
    ended_at
FROM study_sessions";

/// Repository interface for study session records.
pub trait SessionRepository {
    /// Persists a freshly started session stub (`ended_at` absent).
    fn create_session(&self, session: &StudySession) -> RepoResult<SessionId>;
    fn get_session(&self, id: SessionId) -> RepoResult<Option<StudySession>>;
    /// Finished sessions for one character, newest first.
    fn list_finished_sessions(&self, character: CharacterId) -> RepoResult<Vec<StudySession>>;
    /// Number of finished sessions for one character.
    fn finished_count(&self, character: CharacterId) -> RepoResult<i64>;
    /// Sum of finished-session minutes started at or after `since_ms`.
    fn study_minutes_since(&self, character: CharacterId, since_ms: i64) -> RepoResult<f64>;
}

/// SQLite-backed session repository.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn create_session(&self, session: &StudySession) -> RepoResult<SessionId> {
        self.conn.execute(
            "INSERT INTO study_sessions (
                uuid,
                character_uuid,
                subject,
                duration_minutes,
                started_at,
                ended_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                session.uuid.to_string(),
                session.character_uuid.to_string(),
                session.subject.as_deref(),
                session.duration_minutes,
                session.started_at,
                session.ended_at,
            ],
        )?;

        Ok(session.uuid)
    }

    fn get_session(&self, id: SessionId) -> RepoResult<Option<StudySession>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SESSION_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_session_row(row)?));
        }

        Ok(None)
    }

    fn list_finished_sessions(&self, character: CharacterId) -> RepoResult<Vec<StudySession>> {
        let mut stmt = self.conn.prepare(&format!(
            "{SESSION_SELECT_SQL}
             WHERE character_uuid = ?1
               AND ended_at IS NOT NULL
             ORDER BY started_at DESC, uuid ASC;"
        ))?;

        let mut rows = stmt.query([character.to_string()])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(parse_session_row(row)?);
        }

        Ok(sessions)
    }

    fn finished_count(&self, character: CharacterId) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*)
             FROM study_sessions
             WHERE character_uuid = ?1
               AND ended_at IS NOT NULL;",
            [character.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn study_minutes_since(&self, character: CharacterId, since_ms: i64) -> RepoResult<f64> {
        let minutes = self.conn.query_row(
            "SELECT COALESCE(SUM(duration_minutes), 0.0)
             FROM study_sessions
             WHERE character_uuid = ?1
               AND started_at >= ?2
               AND ended_at IS NOT NULL;",
            params![character.to_string(), since_ms],
            |row| row.get(0),
        )?;
        Ok(minutes)
    }
}

fn parse_session_row(row: &Row<'_>) -> RepoResult<StudySession> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{uuid_text}` in study_sessions.uuid"
        ))
    })?;

    let character_text: String = row.get("character_uuid")?;
    let character_uuid = Uuid::parse_str(&character_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{character_text}` in study_sessions.character_uuid"
        ))
    })?;

    Ok(StudySession {
        uuid,
        character_uuid,
        subject: row.get("subject")?,
        duration_minutes: row.get("duration_minutes")?,
        started_at: row.get("started_at")?,
        ended_at: row.get("ended_at")?,
    })
}
