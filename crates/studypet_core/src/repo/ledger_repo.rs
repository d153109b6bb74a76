//! Coin ledger repository: in-transaction append plus read-side queries.
//!
//! # Responsibility
//! - Insert ledger rows from inside reward/purchase transactions.
//! - Expose the per-character history and the reconciled balance.
//!
//! # Invariants
//! - Rows are append-only; no update or delete API exists.
//! - `balance_for_character` must equal `Character::coins` at every commit
//!   boundary.

use crate::model::character::CharacterId;
use crate::model::equipment::{CoinTransaction, TransactionType};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

/// Appends one ledger row using the caller's connection or transaction.
///
/// Callers applying rewards or purchases pass their open `Transaction`
/// (which derefs to `Connection`) so the append commits atomically with
/// the balance change it records.
pub fn append_transaction(conn: &Connection, entry: &CoinTransaction) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO coin_transactions (
            uuid,
            character_uuid,
            amount,
            transaction_type,
            source,
            study_session_uuid,
            equipment_id,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            entry.uuid.to_string(),
            entry.character_uuid.to_string(),
            entry.amount,
            transaction_type_to_db(entry.transaction_type),
            entry.source.as_str(),
            entry.study_session_uuid.map(|id| id.to_string()),
            entry.equipment_id.as_deref(),
            entry.created_at,
        ],
    )?;
    Ok(())
}

/// Repository interface for reading the coin ledger.
pub trait LedgerRepository {
    /// Full history for one character, newest first.
    fn list_for_character(&self, character: CharacterId) -> RepoResult<Vec<CoinTransaction>>;
    /// Signed sum of all amounts for one character.
    fn balance_for_character(&self, character: CharacterId) -> RepoResult<i64>;
}

/// SQLite-backed ledger reader.
pub struct SqliteLedgerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LedgerRepository for SqliteLedgerRepository<'_> {
    fn list_for_character(&self, character: CharacterId) -> RepoResult<Vec<CoinTransaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                uuid,
                character_uuid,
                amount,
                transaction_type,
                source,
                study_session_uuid,
                equipment_id,
                created_at
             FROM coin_transactions
             WHERE character_uuid = ?1
             ORDER BY created_at DESC, uuid ASC;",
        )?;

        let mut rows = stmt.query([character.to_string()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_transaction_row(row)?);
        }

        Ok(entries)
    }

    fn balance_for_character(&self, character: CharacterId) -> RepoResult<i64> {
        let balance = self.conn.query_row(
            "SELECT COALESCE(SUM(amount), 0)
             FROM coin_transactions
             WHERE character_uuid = ?1;",
            [character.to_string()],
            |row| row.get(0),
        )?;
        Ok(balance)
    }
}

fn parse_transaction_row(row: &Row<'_>) -> RepoResult<CoinTransaction> {
    let uuid = parse_uuid_column(row, "uuid")?;
    let character_uuid = parse_uuid_column(row, "character_uuid")?;

    let session_text: Option<String> = row.get("study_session_uuid")?;
    let study_session_uuid = match session_text {
        Some(text) => Some(Uuid::parse_str(&text).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid uuid value `{text}` in coin_transactions.study_session_uuid"
            ))
        })?),
        None => None,
    };

    let type_text: String = row.get("transaction_type")?;
    let transaction_type = parse_transaction_type(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid transaction type `{type_text}` in coin_transactions.transaction_type"
        ))
    })?;

    Ok(CoinTransaction {
        uuid,
        character_uuid,
        amount: row.get("amount")?,
        transaction_type,
        source: row.get("source")?,
        study_session_uuid,
        equipment_id: row.get("equipment_id")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_uuid_column(row: &Row<'_>, column: &str) -> RepoResult<Uuid> {
    let text: String = row.get(column)?;
    Uuid::parse_str(&text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid uuid value `{text}` in coin_transactions.{column}"
        ))
    })
}

fn transaction_type_to_db(value: TransactionType) -> &'static str {
    match value {
        TransactionType::Earned => "earned",
        TransactionType::Spent => "spent",
    }
}

fn parse_transaction_type(value: &str) -> Option<TransactionType> {
    match value {
        "earned" => Some(TransactionType::Earned),
        "spent" => Some(TransactionType::Spent),
        _ => None,
    }
}
