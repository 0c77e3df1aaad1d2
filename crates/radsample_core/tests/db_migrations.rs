use radsample_core::db::migrations::latest_version;
use radsample_core::db::{open_db, open_db_in_memory, DbError};
use radsample_core::RepoError;
use rusqlite::Connection;

#[test]
fn in_memory_database_applies_latest_schema() {
    let conn = open_db_in_memory().unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, latest_version());

    let samples_table: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'samples';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(samples_table, 1);
}

#[test]
fn reopening_a_database_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("milk_samples.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO samples (sample_category, sample_subtype, period_start, period_end,
                station_name, region, activity)
             VALUES ('MILK', 'WHOLE', '01-Jan-24', '31-Jan-24', 'StationA', 'Ontario', 0.05);",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    let rows: i64 = conn
        .query_row("SELECT COUNT(*) FROM samples;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    }

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::UnsupportedSchemaVersion {
            db_version: 999,
            ..
        }
    ));
}

#[test]
fn unreachable_path_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("nested").join("samples.db");

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::Unavailable { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn non_database_file_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("samples.db");
    std::fs::write(&path, "sample_category,station_name\n".repeat(64)).unwrap();

    let err = open_db(&path).unwrap_err();
    assert!(matches!(err, DbError::Unavailable { .. }));
    assert!(matches!(
        RepoError::from(err),
        RepoError::StoreUnavailable { .. }
    ));
}
