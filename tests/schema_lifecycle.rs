use std::path::Path;

use rusqlite::Connection;
use tempfile::TempDir;

use sudoku_cache::{
    config::{StatsPolicy, StoreConfig},
    persist::{
        StoreError,
        schema::{SchemaManager, SchemaOutcome, SeedHook},
        sqlite::SqliteStore,
    },
    puzzle::{PuzzleKey, PuzzleRecord, StatsRecord},
    types::Difficulty,
};

fn config(path: &Path, version: u32, seed: SeedHook) -> StoreConfig {
    StoreConfig {
        schema_version: version,
        seed,
        ..StoreConfig::at(path)
    }
}

fn sample() -> PuzzleRecord {
    PuzzleRecord::new(PuzzleKey::try_from(vec![3u8; 81]).expect("key"), Difficulty::Medium)
}

#[test]
fn ensure_is_idempotent() {
    let mut conn = Connection::open_in_memory().expect("open");
    let manager = SchemaManager::default();

    assert_eq!(
        manager.ensure(&mut conn).expect("first"),
        SchemaOutcome::Created { version: 1 }
    );
    assert_eq!(
        manager.ensure(&mut conn).expect("second"),
        SchemaOutcome::Ready { version: 1 }
    );
    assert_eq!(SchemaManager::recorded_version(&conn).expect("version"), 1);
}

#[test]
fn version_bump_drops_all_data() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("cache.db");

    let store = SqliteStore::open_with_config(&config(&db_path, 1, SeedHook::None)).expect("v1");
    store.replace_all(&[sample()]).expect("replace");
    store.update_high_score(42).expect("stats");
    drop(store);

    let store = SqliteStore::open_with_config(&config(&db_path, 2, SeedHook::None)).expect("v2");
    assert_eq!(store.schema_outcome(), SchemaOutcome::Upgraded { from: 1, to: 2 });
    assert!(store.get_all().expect("all").is_empty());
    assert!(store.get_stats().unwrap_err().is_not_found());
}

#[test]
fn upgrade_reruns_seed_hook() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("cache.db");

    let store =
        SqliteStore::open_with_config(&config(&db_path, 1, SeedHook::DefaultStats)).expect("v1");
    store.update_high_score(42).expect("stats");
    drop(store);

    let store =
        SqliteStore::open_with_config(&config(&db_path, 3, SeedHook::DefaultStats)).expect("v3");
    assert_eq!(store.get_stats().expect("stats"), StatsRecord::default());
}

#[test]
fn newer_file_is_refused() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("cache.db");
    drop(SqliteStore::open_with_config(&config(&db_path, 4, SeedHook::None)).expect("v4"));

    match SqliteStore::open_with_config(&config(&db_path, 1, SeedHook::None)) {
        Err(StoreError::SchemaTooNew { found: 4, supported: 1 }) => {}
        Err(other) => panic!("unexpected error {other:?}"),
        Ok(_) => panic!("expected newer schema to be refused"),
    }
}

#[test]
fn recreate_tables_discards_everything() {
    let store = SqliteStore::open_in_memory().expect("open");
    store.replace_all(&[sample()]).expect("replace");
    store.update_races_won(9).expect("stats");

    let outcome = store.recreate_tables().expect("recreate");
    assert_eq!(outcome, SchemaOutcome::Created { version: 1 });
    assert!(store.get_all().expect("all").is_empty());
    assert!(store.get_stats().unwrap_err().is_not_found());
}

#[test]
fn recreate_tables_refreshes_outcome_and_keeps_configured_version() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("cache.db");
    drop(SqliteStore::open_with_config(&config(&db_path, 2, SeedHook::DefaultStats)).expect("v2"));

    let store =
        SqliteStore::open_with_config(&config(&db_path, 2, SeedHook::DefaultStats)).expect("reopen");
    let other_handle = store.clone();
    assert_eq!(store.schema_outcome(), SchemaOutcome::Ready { version: 2 });
    store.update_high_score(50).expect("stats");

    assert_eq!(
        store.recreate_tables().expect("recreate"),
        SchemaOutcome::Created { version: 2 }
    );
    assert_eq!(other_handle.schema_outcome(), SchemaOutcome::Created { version: 2 });
    assert_eq!(store.get_stats().expect("seeded"), StatsRecord::default());

    let raw = Connection::open(&db_path).expect("raw");
    assert_eq!(SchemaManager::recorded_version(&raw).expect("version"), 2);
}

#[test]
fn open_under_a_regular_file_fails() {
    let tmp = TempDir::new().expect("tmp");
    let blocker = tmp.path().join("blocker");
    std::fs::write(&blocker, b"not a directory").expect("write");

    let res = SqliteStore::open(blocker.join("cache.db"));
    assert!(
        matches!(res, Err(StoreError::Io(_) | StoreError::Sqlite(_))),
        "expected a storage fault"
    );
}

#[test]
fn open_on_a_directory_fails() {
    let tmp = TempDir::new().expect("tmp");
    let res = SqliteStore::open(tmp.path());
    assert!(
        matches!(res, Err(StoreError::Io(_) | StoreError::Sqlite(_))),
        "expected a storage fault"
    );
}

#[test]
fn failed_ensure_leaves_version_and_tables_untouched() {
    let mut conn = Connection::open_in_memory().expect("open");
    conn.execute_batch("CREATE TABLE stats (legacy INTEGER NOT NULL);")
        .expect("conflicting table");

    let manager = SchemaManager::new(1, SeedHook::DefaultStats);
    assert!(matches!(manager.ensure(&mut conn), Err(StoreError::Sqlite(_))));

    assert_eq!(SchemaManager::recorded_version(&conn).expect("version"), 0);
    let puzzle_tables: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'puzzle'",
            [],
            |row| row.get(0),
        )
        .expect("count");
    assert_eq!(puzzle_tables, 0);
}

#[test]
fn store_config_reads_toml() {
    let cfg = StoreConfig::from_toml_str(
        r#"
        path = "data/puzzles.db"
        seed = "default_stats"
        stats_policy = "require_row"
        "#,
    )
    .expect("toml");

    assert_eq!(cfg.path.as_deref(), Some(Path::new("data/puzzles.db")));
    assert_eq!(cfg.seed, SeedHook::DefaultStats);
    assert_eq!(cfg.stats_policy, StatsPolicy::RequireRow);
    assert_eq!(cfg.schema_version, 1);
    assert!(cfg.wal);
}
