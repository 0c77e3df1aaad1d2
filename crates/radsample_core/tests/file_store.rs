use radsample_core::{
    write_records, CleaningMode, FileStore, Record, RecordFields, RepoError, RowOutcome,
    SkipKind, SOURCE_HEADER,
};
use std::path::Path;

fn record(station: &str, activity: f64, error: Option<f64>, ratio: Option<f64>) -> Record {
    Record::try_from_fields(RecordFields {
        sample_category: "MILK".to_string(),
        sample_subtype: "WHOLE".to_string(),
        period_start: "01-Jan-24".to_string(),
        period_end: "31-Jan-24".to_string(),
        station_name: station.to_string(),
        region: "Ontario".to_string(),
        activity,
        activity_error: error,
        activity_per_calcium: ratio,
    })
    .unwrap()
}

fn write_source(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("source.csv");
    std::fs::write(&path, format!("{}\n{body}", SOURCE_HEADER.join(","))).unwrap();
    path
}

#[test]
fn saved_records_reload_field_for_field() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("unused.csv"), dir.path(), CleaningMode::DropEmpty);
    let records = vec![
        record("StationA", 0.05, Some(0.01), Some(0.04)),
        record("Ottawa, East", 1.5e-2, Some(2.25e-3), None),
        record("StationC", 0.0, None, None),
    ];

    let saved = store.save(&records).unwrap();
    let reloaded = FileStore::new(&saved, dir.path(), CleaningMode::DropEmpty)
        .load(None)
        .unwrap();

    assert!(reloaded.skipped.is_empty());
    assert_eq!(reloaded.records, records);
}

#[test]
fn drop_empty_reload_skips_record_with_interior_absent_value() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("unused.csv"), dir.path(), CleaningMode::DropEmpty);
    let kept = record("StationA", 0.05, Some(0.01), None);
    let gapped = record("StationB", 0.05, None, Some(0.04));

    let saved = store.save(&[kept.clone(), gapped]).unwrap();
    let reloaded = FileStore::new(&saved, dir.path(), CleaningMode::DropEmpty)
        .load(None)
        .unwrap();

    assert_eq!(reloaded.records, vec![kept]);
    assert_eq!(reloaded.skipped.len(), 1);
    assert_eq!(reloaded.skipped[0].row_number, 2);
    assert!(matches!(
        reloaded.skipped[0].kind,
        SkipKind::InsufficientValues {
            found: 8,
            required: 9
        }
    ));
}

#[test]
fn preserve_index_round_trips_interior_absent_values() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("unused.csv"), dir.path(), CleaningMode::PreserveIndex);
    let records = vec![record("StationA", 0.05, None, Some(0.04))];

    let saved = store.save(&records).unwrap();
    let reloaded = FileStore::new(&saved, dir.path(), CleaningMode::PreserveIndex)
        .load(None)
        .unwrap();

    assert_eq!(reloaded.records, records);
}

#[test]
fn each_save_writes_a_new_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("exports");
    let store = FileStore::new(dir.path().join("unused.csv"), &output, CleaningMode::DropEmpty);
    let records = vec![record("StationA", 0.05, None, None)];

    let first = store.save(&records).unwrap();
    let second = store.save(&records).unwrap();

    assert_ne!(first, second);
    assert!(first.starts_with(&output));
    assert!(first.exists());
    assert!(second.exists());
    assert_eq!(first.extension().and_then(|ext| ext.to_str()), Some("csv"));
}

#[test]
fn written_rows_use_source_header_and_empty_optional_cells() {
    let mut buffer = Vec::new();
    write_records(&mut buffer, &[record("StationA", 0.05, None, None)]).unwrap();

    let text = String::from_utf8(buffer).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(SOURCE_HEADER.join(",").as_str()));
    assert_eq!(
        lines.next(),
        Some("MILK,WHOLE,01-Jan-24,31-Jan-24,StationA,Ontario,0.05,,")
    );
    assert_eq!(lines.next(), None);
}

#[test]
fn missing_source_is_store_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path().join("absent.csv"), dir.path(), CleaningMode::DropEmpty);

    let err = store.load(None).unwrap_err();
    assert!(matches!(err, RepoError::StoreUnavailable { .. }));
    assert!(matches!(store.rows(), Err(RepoError::StoreUnavailable { .. })));
}

#[test]
fn load_reports_skipped_rows_and_honours_row_bound() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(
        dir.path(),
        "MILK,WHOLE,01-Jan-24,31-Jan-24,StationA,Ontario,0.05,0.01,0.04\n\
         MILK,WHOLE\n\
         MILK,WHOLE,01-Feb-24,28-Feb-24,StationB,Quebec,0.07,,\n",
    );
    let store = FileStore::new(&source, dir.path(), CleaningMode::DropEmpty);

    let full = store.load(None).unwrap();
    assert_eq!(full.rows_read, 3);
    assert_eq!(full.records.len(), 2);
    assert_eq!(full.skipped.len(), 1);
    assert_eq!(full.skipped[0].row_number, 2);

    let bounded = store.load(Some(1)).unwrap();
    assert_eq!(bounded.rows_read, 1);
    assert_eq!(bounded.records.len(), 1);
}

#[test]
fn rows_stream_lazily_from_the_source() {
    let dir = tempfile::tempdir().unwrap();
    let source = write_source(
        dir.path(),
        "MILK,WHOLE,01-Jan-24,31-Jan-24,StationA,Ontario,0.05,,\n",
    );
    let store = FileStore::new(&source, dir.path(), CleaningMode::DropEmpty);

    let mut rows = store.rows().unwrap();
    assert!(matches!(
        rows.next(),
        Some(Ok(RowOutcome::Parsed { row_number: 1, .. }))
    ));
    assert!(rows.next().is_none());
}
