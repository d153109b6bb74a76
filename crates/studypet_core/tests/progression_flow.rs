use rusqlite::Connection;
use studypet_core::db::open_db_in_memory;
use studypet_core::{
    Character, CharacterService, EngineError, EquipmentService, LedgerRepository,
    ProgressionService, RegistryError, RepoError, SessionRegistry, SessionRepository,
    SqliteCharacterRepository, SqliteLedgerRepository, SqliteSessionRepository,
};
use uuid::Uuid;

const MIN_MS: i64 = 60_000;

fn engine() -> (Connection, SessionRegistry) {
    (open_db_in_memory().unwrap(), SessionRegistry::new())
}

fn create_character(conn: &Connection, name: &str) -> Character {
    CharacterService::new(SqliteCharacterRepository::new(conn))
        .create_character(name, 0)
        .unwrap()
}

fn reload(conn: &Connection, character: &Character) -> Character {
    CharacterService::new(SqliteCharacterRepository::new(conn))
        .get_character(character.uuid)
        .unwrap()
        .unwrap()
}

#[test]
fn start_persists_stub_and_registers_timer() {
    let (mut conn, registry) = engine();
    let character = create_character(&conn, "mio");

    let session = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, Some("math"), 5 * MIN_MS)
        .unwrap();

    let timer = registry.lookup(session).unwrap();
    assert_eq!(timer.character_uuid, character.uuid);
    assert_eq!(timer.started_at, 5 * MIN_MS);

    let stub = SqliteSessionRepository::new(&conn)
        .get_session(session)
        .unwrap()
        .unwrap();
    assert!(!stub.is_finished());
    assert_eq!(stub.duration_minutes, 0.0);
    assert_eq!(stub.subject.as_deref(), Some("math"));
}

#[test]
fn start_with_unknown_character_fails() {
    let (mut conn, registry) = engine();

    let err = ProgressionService::new(&mut conn, &registry)
        .start_session(Uuid::new_v4(), None, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Repo(RepoError::CharacterNotFound(_))
    ));
    assert_eq!(registry.active_count(), 0);
}

#[test]
fn sixty_five_minute_session_grants_full_rewards() {
    let (mut conn, registry) = engine();
    let character = create_character(&conn, "mio");

    let session = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, None, 0)
        .unwrap();
    let summary = ProgressionService::new(&mut conn, &registry)
        .stop_session(session, 65 * MIN_MS)
        .unwrap();

    assert_eq!(summary.duration_minutes, 65.0);
    assert_eq!(summary.experience_gained, 650);
    assert_eq!(summary.coins_gained, 95);
    assert!(summary.level_up);
    assert_eq!(summary.new_level, 3);
    assert_eq!(summary.total_experience, 650);
    assert_eq!(summary.total_coins, 95);
    assert_eq!(summary.equipment_bonus.experience_multiplier, 1.0);
    assert!(summary.equipment_bonus.effects.is_empty());

    let updated = reload(&conn, &character);
    assert_eq!(updated.experience, 650);
    assert_eq!(updated.coins, 95);
    assert_eq!(updated.level, 3);
    assert_eq!(updated.total_study_minutes, 65.0);

    let finished = SqliteSessionRepository::new(&conn)
        .get_session(session)
        .unwrap()
        .unwrap();
    assert_eq!(finished.ended_at, Some(65 * MIN_MS));
    assert_eq!(finished.duration_minutes, 65.0);

    let ledger = SqliteLedgerRepository::new(&conn);
    let entries = ledger.list_for_character(character.uuid).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].amount, 95);
    assert_eq!(entries[0].source, "study");
    assert_eq!(entries[0].study_session_uuid, Some(session));
    assert_eq!(
        ledger.balance_for_character(character.uuid).unwrap(),
        updated.coins
    );

    assert_eq!(registry.active_count(), 0);
}

#[test]
fn second_stop_fails_and_does_not_double_apply() {
    let (mut conn, registry) = engine();
    let character = create_character(&conn, "mio");

    let session = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, None, 0)
        .unwrap();
    ProgressionService::new(&mut conn, &registry)
        .stop_session(session, 65 * MIN_MS)
        .unwrap();

    let err = ProgressionService::new(&mut conn, &registry)
        .stop_session(session, 120 * MIN_MS)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Registry(RegistryError::SessionNotFound(id)) if id == session
    ));

    let updated = reload(&conn, &character);
    assert_eq!(updated.experience, 650);
    assert_eq!(updated.coins, 95);
    assert_eq!(
        SqliteLedgerRepository::new(&conn)
            .list_for_character(character.uuid)
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn stop_without_running_timer_fails() {
    let (mut conn, registry) = engine();
    create_character(&conn, "mio");

    let bogus = Uuid::new_v4();
    let err = ProgressionService::new(&mut conn, &registry)
        .stop_session(bogus, MIN_MS)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Registry(RegistryError::SessionNotFound(id)) if id == bogus
    ));
}

#[test]
fn failed_finalize_keeps_timer_for_retry() {
    let (mut conn, registry) = engine();
    let character = create_character(&conn, "mio");

    let session = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, None, 0)
        .unwrap();

    // Simulate a store inconsistency: the stub row vanishes while the
    // timer is still running.
    conn.execute(
        "DELETE FROM study_sessions WHERE uuid = ?1;",
        [session.to_string()],
    )
    .unwrap();

    let err = ProgressionService::new(&mut conn, &registry)
        .stop_session(session, 30 * MIN_MS)
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Repo(RepoError::SessionNotFound(id)) if id == session
    ));

    // The transaction rolled back and the claim was released.
    let updated = reload(&conn, &character);
    assert_eq!(updated.experience, 0);
    assert_eq!(updated.coins, 0);
    assert!(registry.lookup(session).is_some());
}

#[test]
fn equipped_accessories_scale_stop_rewards() {
    let (mut conn, registry) = engine();
    let character = create_character(&conn, "mio");

    // Earn spending money the regular way: one long session.
    let earn = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, None, 0)
        .unwrap();
    let earned = ProgressionService::new(&mut conn, &registry)
        .stop_session(earn, 600 * MIN_MS)
        .unwrap();
    assert_eq!(earned.coins_gained, 630);

    let mut shop = EquipmentService::new(&mut conn);
    shop.seed_catalog().unwrap();
    shop.purchase(character.uuid, "book", 600 * MIN_MS).unwrap();
    shop.purchase(character.uuid, "hat", 600 * MIN_MS).unwrap();
    shop.equip(character.uuid, "book").unwrap();
    shop.equip(character.uuid, "hat").unwrap();

    let start_ms = 700 * MIN_MS;
    let session = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, None, start_ms)
        .unwrap();
    let summary = ProgressionService::new(&mut conn, &registry)
        .stop_session(session, start_ms + 40 * MIN_MS)
        .unwrap();

    // 40 min: base 400 exp * 1.05 (book), base 50 coins * 1.10 (hat).
    assert_eq!(summary.experience_gained, 420);
    assert_eq!(summary.coins_gained, 55);
    assert_eq!(summary.equipment_bonus.effects, vec!["知識の蓄積", "幸運の帽子"]);

    let updated = reload(&conn, &character);
    assert_eq!(updated.experience, 6000 + 420);
    assert_eq!(updated.coins, 630 - 300 - 100 + 55);
    assert_eq!(
        SqliteLedgerRepository::new(&conn)
            .balance_for_character(character.uuid)
            .unwrap(),
        updated.coins
    );
}

#[test]
fn concurrent_timers_for_one_character_settle_independently() {
    let (mut conn, registry) = engine();
    let character = create_character(&conn, "mio");

    let first = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, Some("math"), 0)
        .unwrap();
    let second = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, Some("history"), 10 * MIN_MS)
        .unwrap();
    assert_eq!(registry.active_count(), 2);

    ProgressionService::new(&mut conn, &registry)
        .stop_session(second, 20 * MIN_MS)
        .unwrap();
    let summary = ProgressionService::new(&mut conn, &registry)
        .stop_session(first, 30 * MIN_MS)
        .unwrap();

    // first: 30 min (300 exp, 40 coins); second: 10 min (100 exp, 10 coins).
    assert_eq!(summary.total_experience, 400);
    assert_eq!(summary.total_coins, 50);
    assert_eq!(registry.active_count(), 0);

    let sessions = SqliteSessionRepository::new(&conn)
        .list_finished_sessions(character.uuid)
        .unwrap();
    assert_eq!(sessions.len(), 2);
    // Newest first by start instant.
    assert_eq!(sessions[0].uuid, second);
    assert_eq!(sessions[1].uuid, first);
}

#[test]
fn stop_summary_serializes_with_stable_field_names() {
    let (mut conn, registry) = engine();
    let character = create_character(&conn, "mio");

    let session = ProgressionService::new(&mut conn, &registry)
        .start_session(character.uuid, None, 0)
        .unwrap();
    let summary = ProgressionService::new(&mut conn, &registry)
        .stop_session(session, 65 * MIN_MS)
        .unwrap();

    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["experience_gained"], 650);
    assert_eq!(value["coins_gained"], 95);
    assert_eq!(value["level_up"], true);
    assert_eq!(value["new_level"], 3);
    assert_eq!(value["equipment_bonus"]["experience_multiplier"], 1.0);
}
