//! Character use-case service.
//!
//! # Responsibility
//! - Provide stable character entry points for core callers.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Creation always yields a valid level-1 record.
//! - Service layer remains storage-agnostic.

use crate::model::character::{Character, CharacterId};
use crate::repo::character_repo::CharacterRepository;
use crate::repo::RepoResult;
use log::info;

/// Use-case service wrapper for character records.
pub struct CharacterService<R: CharacterRepository> {
    repo: R,
}

impl<R: CharacterRepository> CharacterService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a fresh level-1 character from a naming action.
    pub fn create_character(&self, name: impl Into<String>, now_ms: i64) -> RepoResult<Character> {
        let character = Character::new(name, now_ms);
        self.repo.create_character(&character)?;
        info!(
            "event=character_create module=character status=ok character={}",
            character.uuid
        );
        Ok(character)
    }

    /// Gets one character by stable ID.
    pub fn get_character(&self, id: CharacterId) -> RepoResult<Option<Character>> {
        self.repo.get_character(id)
    }

    /// Lists all characters, oldest first.
    pub fn list_characters(&self) -> RepoResult<Vec<Character>> {
        self.repo.list_characters()
    }
}
