//! Character repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `characters` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths call `Character::validate()` before SQL mutations.
//! - Read paths reject drifted persisted state (level vs experience)
//!   instead of masking it.

use crate::model::character::{Character, CharacterId};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const CHARACTER_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    level,
    experience,
    coins,
    total_study_minutes,
    current_color,
    created_at
FROM characters";

/// Repository interface for character records.
pub trait CharacterRepository {
    fn create_character(&self, character: &Character) -> RepoResult<CharacterId>;
    fn get_character(&self, id: CharacterId) -> RepoResult<Option<Character>>;
    fn list_characters(&self) -> RepoResult<Vec<Character>>;
}

/// SQLite-backed character repository.
pub struct SqliteCharacterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCharacterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CharacterRepository for SqliteCharacterRepository<'_> {
    fn create_character(&self, character: &Character) -> RepoResult<CharacterId> {
        character.validate()?;

        self.conn.execute(
            "INSERT INTO characters (
                uuid,
                name,
                level,
                experience,
                coins,
                total_study_minutes,
                current_color,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                character.uuid.to_string(),
                character.name.as_str(),
                character.level,
                character.experience,
                character.coins,
                character.total_study_minutes,
                character.current_color.as_str(),
                character.created_at,
            ],
        )?;

        Ok(character.uuid)
    }

    fn get_character(&self, id: CharacterId) -> RepoResult<Option<Character>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHARACTER_SELECT_SQL} WHERE uuid = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_character_row(row)?));
        }

        Ok(None)
    }

    fn list_characters(&self) -> RepoResult<Vec<Character>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CHARACTER_SELECT_SQL} ORDER BY created_at ASC, uuid ASC;"))?;

        let mut rows = stmt.query([])?;
        let mut characters = Vec::new();
        while let Some(row) = rows.next()? {
            characters.push(parse_character_row(row)?);
        }

        Ok(characters)
    }
}

/// Loads a character or reports `CharacterNotFound`.
///
/// Shared by services that treat a missing record as a client error.
pub fn require_character(conn: &Connection, id: CharacterId) -> RepoResult<Character> {
    SqliteCharacterRepository::new(conn)
        .get_character(id)?
        .ok_or(RepoError::CharacterNotFound(id))
}

fn parse_character_row(row: &Row<'_>) -> RepoResult<Character> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = Uuid::parse_str(&uuid_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in characters.uuid"))
    })?;

    let character = Character {
        uuid,
        name: row.get("name")?,
        level: row.get("level")?,
        experience: row.get("experience")?,
        coins: row.get("coins")?,
        total_study_minutes: row.get("total_study_minutes")?,
        current_color: row.get("current_color")?,
        created_at: row.get("created_at")?,
    };
    character.validate()?;
    Ok(character)
}
