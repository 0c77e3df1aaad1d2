use radsample_core::db::open_db_in_memory;
use radsample_core::{
    CleaningMode, FileSampleRepository, FileStore, ListQuery, RecordField, RecordFields,
    RecordPatch, SampleService, ServiceError, SqliteSampleRepository, ValidationError,
    SOURCE_HEADER,
};

fn fields(station: &str, region: &str, activity: f64) -> RecordFields {
    RecordFields {
        sample_category: "MILK".to_string(),
        sample_subtype: "WHOLE".to_string(),
        period_start: "01-Jan-24".to_string(),
        period_end: "31-Jan-24".to_string(),
        station_name: station.to_string(),
        region: region.to_string(),
        activity,
        activity_error: None,
        activity_per_calcium: None,
    }
}

#[test]
fn create_and_get_sample() {
    let conn = open_db_in_memory().unwrap();
    let mut service = SampleService::new(SqliteSampleRepository::try_new(&conn).unwrap());

    let id = service
        .create_sample(fields(" StationA ", "Ontario", 0.05))
        .unwrap();

    let stored = service.get_sample(id).unwrap().unwrap();
    assert_eq!(stored.record.station_name(), "StationA");
    assert_eq!(service.sample_count().unwrap(), 1);
    assert!(service.get_sample(id + 1).unwrap().is_none());
}

#[test]
fn invalid_input_is_rejected_before_storage() {
    let conn = open_db_in_memory().unwrap();
    let mut service = SampleService::new(SqliteSampleRepository::try_new(&conn).unwrap());

    let err = service
        .create_sample(fields("StationA", "", 0.05))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::MissingField(RecordField::Region))
    ));

    let err = service
        .create_sample(fields("StationA", "Ontario", -1.0))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Validation(ValidationError::Range {
            field: RecordField::Activity,
            ..
        })
    ));
    assert_eq!(service.sample_count().unwrap(), 0);
}

#[test]
fn edit_sample_returns_previous_and_replacement() {
    let conn = open_db_in_memory().unwrap();
    let mut service = SampleService::new(SqliteSampleRepository::try_new(&conn).unwrap());
    let id = service
        .create_sample(fields("StationA", "Ontario", 0.05))
        .unwrap();
    let patch = RecordPatch {
        region: Some("Quebec".to_string()),
        activity_error: Some(Some(0.002)),
        ..RecordPatch::default()
    };

    let (previous, replacement) = service.edit_sample(id, &patch).unwrap().unwrap();

    assert_eq!(previous.region(), "Ontario");
    assert_eq!(replacement.region(), "Quebec");
    assert_eq!(replacement.activity_error(), Some(0.002));
    assert_eq!(replacement.station_name(), "StationA");
    assert_eq!(service.get_sample(id).unwrap().unwrap().record, replacement);
    assert!(service.edit_sample(id + 10, &patch).unwrap().is_none());
}

#[test]
fn invalid_edit_leaves_sample_unchanged() {
    let conn = open_db_in_memory().unwrap();
    let mut service = SampleService::new(SqliteSampleRepository::try_new(&conn).unwrap());
    let id = service
        .create_sample(fields("StationA", "Ontario", 0.05))
        .unwrap();
    let patch = RecordPatch {
        activity: Some(f64::NAN),
        ..RecordPatch::default()
    };

    assert!(matches!(
        service.edit_sample(id, &patch),
        Err(ServiceError::Validation(_))
    ));
    assert_eq!(
        service.get_sample(id).unwrap().unwrap().record.activity(),
        0.05
    );
}

#[test]
fn delete_sample_returns_removed_record() {
    let conn = open_db_in_memory().unwrap();
    let mut service = SampleService::new(SqliteSampleRepository::try_new(&conn).unwrap());
    let id = service
        .create_sample(fields("StationA", "Ontario", 0.05))
        .unwrap();

    let removed = service.delete_sample(id).unwrap().unwrap();

    assert_eq!(removed.station_name(), "StationA");
    assert!(service.delete_sample(id).unwrap().is_none());
    assert!(service.list_samples(&ListQuery::default()).unwrap().is_empty());
}

#[test]
fn queries_and_statistics_cover_all_samples() {
    let conn = open_db_in_memory().unwrap();
    let mut service = SampleService::new(SqliteSampleRepository::try_new(&conn).unwrap());
    for (station, region, activity) in [
        ("StationB", "Quebec", 0.06),
        ("StationA", "Ontario", 0.02),
        ("StationA", "Ontario", 0.0),
        ("StationC", "Manitoba", 0.04),
    ] {
        service
            .create_sample(fields(station, region, activity))
            .unwrap();
    }

    assert_eq!(
        service.available_regions().unwrap(),
        vec!["Manitoba", "Ontario", "Quebec"]
    );
    assert_eq!(
        service.available_stations().unwrap(),
        vec!["StationA", "StationB", "StationC"]
    );
    assert_eq!(service.samples_by_region("Ontario").unwrap().len(), 2);
    assert_eq!(service.samples_by_station("StationC").unwrap().len(), 1);

    let stats = service.statistics().unwrap();
    assert_eq!(stats.total_samples, 4);
    assert_eq!(stats.unique_regions, 3);
    assert_eq!(stats.unique_stations, 3);
    assert_eq!(stats.valid_activity_readings, 3);
    assert!((stats.average_activity - 0.04).abs() < 1e-12);
}

#[test]
fn statistics_on_empty_repository_average_zero() {
    let conn = open_db_in_memory().unwrap();
    let service = SampleService::new(SqliteSampleRepository::try_new(&conn).unwrap());

    let stats = service.statistics().unwrap();
    assert_eq!(stats.total_samples, 0);
    assert_eq!(stats.average_activity, 0.0);
    assert!(stats.regions.is_empty());
}

#[test]
fn file_backed_service_reloads_and_saves() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.csv");
    std::fs::write(
        &source,
        format!(
            "{}\nMILK,WHOLE,01-Jan-24,31-Jan-24,StationA,Ontario,0.05,,\nMILK\n",
            SOURCE_HEADER.join(",")
        ),
    )
    .unwrap();
    let store = FileStore::new(&source, dir.path().join("out"), CleaningMode::DropEmpty);
    let mut service = SampleService::new(FileSampleRepository::new(store));

    let skipped = service.reload(None).unwrap();
    assert_eq!(skipped.len(), 1);
    assert_eq!(service.sample_count().unwrap(), 1);

    service
        .create_sample(fields("StationB", "Quebec", 0.07))
        .unwrap();
    let saved = service.save_to_new_file().unwrap();

    let reloaded = FileStore::new(saved, dir.path(), CleaningMode::DropEmpty)
        .load(None)
        .unwrap();
    assert_eq!(reloaded.records.len(), 2);
    assert_eq!(reloaded.records[1].region(), "Quebec");

    service.reload(None).unwrap();
    assert_eq!(service.sample_count().unwrap(), 1);
}
