use rusqlite::Connection;
use studypet_core::db::migrations::latest_version;
use studypet_core::db::{open_db, open_db_in_memory, DbError};

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "characters");
    assert_table_exists(&conn, "study_sessions");
    assert_table_exists(&conn, "equipment");
    assert_table_exists(&conn, "character_equipment");
    assert_table_exists(&conn, "coin_transactions");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("studypet.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "characters");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn character_defaults_match_schema() {
    let conn = open_db_in_memory().unwrap();

    conn.execute(
        "INSERT INTO characters (uuid, name, created_at)
         VALUES ('11111111-1111-1111-1111-111111111111', 'seed', 0);",
        [],
    )
    .unwrap();

    let (level, experience, coins, color): (i64, i64, i64, String) = conn
        .query_row(
            "SELECT level, experience, coins, current_color
             FROM characters
             WHERE uuid = '11111111-1111-1111-1111-111111111111';",
            [],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                ))
            },
        )
        .unwrap();

    assert_eq!(level, 1);
    assert_eq!(experience, 0);
    assert_eq!(coins, 0);
    assert_eq!(color, "#8B4513");
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
