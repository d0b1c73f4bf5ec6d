mod helpers;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use argo_ingest::ocean::OceanRegion;
use argo_ingest::pipeline::{FileError, FileOutcome, PipelineError};
use argo_ingest::store::{parse_date, MeasurementFilter};
use helpers::{
    count_rows, north_atlantic_cast, tfidf_pipeline, write_argo_file, write_classic_argo_file, Cast,
};
use tempfile::TempDir;

#[test]
fn end_to_end_single_cast() {
    let tmp = TempDir::new().unwrap();
    write_argo_file(tmp.path(), "R5904123_001.nc", "5904123", &[north_atlantic_cast()]);

    let mut pipeline = tfidf_pipeline();
    let report = pipeline.process_directory(tmp.path()).unwrap();
    assert_eq!(report.files_ingested, 1);
    assert_eq!(report.measurements, 2);
    assert_eq!(report.profiles, 1);

    let conn = pipeline.conn();
    assert_eq!(count_rows(conn, "measurements"), 2);
    assert_eq!(count_rows(conn, "profiles"), 1);

    let (id, quality, region, summary, embedding): (String, f64, String, String, Option<String>) = conn
        .query_row(
            "SELECT id, data_quality_score, ocean_region, summary_text, vector_embedding FROM profiles",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?)),
        )
        .unwrap();
    assert_eq!(id, "5904123_1");
    assert!((quality - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(region, "North Atlantic");
    assert!(summary.starts_with("ARGO float 5904123 profile 1 at 45.00°N -100.00°E in North Atlantic"));

    let vector: Vec<f32> = serde_json::from_str(&embedding.expect("embedding written back")).unwrap();
    assert_eq!(vector.len(), 1000);
    assert_eq!(pipeline.index().vector(&id), Some(vector.as_slice()));

    let levels: Vec<i64> = conn
        .prepare("SELECT level_index FROM measurements ORDER BY level_index")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(levels, [0, 2]);
}

#[test]
fn corrupt_file_does_not_stop_valid_one() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("a_corrupt.nc"), b"CDF\x01 truncated header").unwrap();
    write_argo_file(tmp.path(), "b_valid.nc", "6901000", &[north_atlantic_cast()]);

    let mut pipeline = tfidf_pipeline();
    let report = pipeline.process_directory(tmp.path()).unwrap();

    assert_eq!(report.files_seen, 2);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.files_ingested, 1);
    assert_eq!(report.failures[0].kind, "decode");
    assert!(report.failures[0].file.ends_with("a_corrupt.nc"));

    let platforms: Vec<String> = pipeline
        .conn()
        .prepare("SELECT DISTINCT platform_number FROM measurements")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(platforms, ["6901000"]);
}

#[test]
fn reingesting_same_file_is_idempotent() {
    let tmp = TempDir::new().unwrap();
    let casts = [
        north_atlantic_cast(),
        Cast::new(2, 30.0, 150.0, &[(25.0, 34.0, 10.0), (15.0, 34.5, 200.0), (5.0, 34.6, 900.0)]),
    ];
    let path = write_argo_file(tmp.path(), "f.nc", "5904123", &casts);

    let mut pipeline = tfidf_pipeline();
    assert!(matches!(
        pipeline.process_file(&path),
        FileOutcome::Ingested { measurements: 5, profiles: 2 }
    ));
    let measurements = count_rows(pipeline.conn(), "measurements");
    let profiles = count_rows(pipeline.conn(), "profiles");

    pipeline.process_directory(tmp.path()).unwrap();
    assert_eq!(count_rows(pipeline.conn(), "measurements"), measurements);
    assert_eq!(count_rows(pipeline.conn(), "profiles"), profiles);
    assert_eq!(pipeline.index().len(), 2);
}

#[test]
fn all_invalid_levels_is_empty_outcome() {
    let tmp = TempDir::new().unwrap();
    let nan = f64::NAN;
    let path = write_argo_file(
        tmp.path(),
        "empty.nc",
        "1",
        &[Cast::new(1, 0.0, 0.0, &[(nan, 35.0, 5.0), (4.0, nan, 10.0), (4.0, 35.0, nan)])],
    );

    let mut pipeline = tfidf_pipeline();
    assert!(matches!(pipeline.process_file(&path), FileOutcome::Empty));
    assert_eq!(count_rows(pipeline.conn(), "measurements"), 0);
    assert_eq!(count_rows(pipeline.conn(), "profiles"), 0);
    assert!(pipeline.index().is_empty());
}

#[test]
fn missing_file_fails_with_decode_error() {
    let mut pipeline = tfidf_pipeline();
    let outcome = pipeline.process_file(std::path::Path::new("/no/such/file.nc"));
    assert!(matches!(outcome, FileOutcome::Failed(FileError::Decode(_))));
}

#[test]
fn missing_directory_is_reported() {
    let mut pipeline = tfidf_pipeline();
    let tmp = TempDir::new().unwrap();
    let err = pipeline.process_directory(&tmp.path().join("absent")).unwrap_err();
    assert!(matches!(err, PipelineError::DirectoryNotFound(_)));
    assert!(err.to_string().contains("absent"));
}

#[test]
fn cancellation_stops_between_files() {
    let tmp = TempDir::new().unwrap();
    for (i, name) in ["a.nc", "b.nc", "c.nc"].iter().enumerate() {
        write_argo_file(tmp.path(), name, &format!("70{i}"), &[north_atlantic_cast()]);
    }

    let flag = Arc::new(AtomicBool::new(false));
    let trigger = Arc::clone(&flag);
    let mut pipeline = tfidf_pipeline().with_cancel_flag(flag);
    let report = pipeline
        .process_directory_with(tmp.path(), |_, _| trigger.store(true, Ordering::Relaxed))
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.files_seen, 1);
    assert_eq!(report.files_ingested, 1);
    assert_eq!(count_rows(pipeline.conn(), "profiles"), 1);
}

#[test]
fn queries_over_ingested_data() {
    let tmp = TempDir::new().unwrap();
    write_argo_file(tmp.path(), "a.nc", "100", &[north_atlantic_cast()]);
    write_argo_file(
        tmp.path(),
        "b.nc",
        "200",
        &[Cast::new(9, -70.0, 10.0, &[(-1.0, 34.1, 10.0)]).on_day(31.0)],
    );

    let mut pipeline = tfidf_pipeline().with_query_limit(10);
    pipeline.process_directory(tmp.path()).unwrap();

    let southern = MeasurementFilter {
        region: Some(OceanRegion::SouthernOcean),
        ..Default::default()
    };
    let rows = pipeline.query_measurements(&southern).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].platform_number, "200");
    assert_eq!(rows[0].time, "2024-02-01T00:00:00.000000Z");

    let january = MeasurementFilter {
        end: Some(parse_date("2024-01-31").unwrap()),
        ..Default::default()
    };
    assert_eq!(pipeline.query_measurements(&january).unwrap().len(), 2);

    let stats = pipeline.stats().unwrap();
    assert_eq!(stats.total_measurements, 3);
    assert_eq!(stats.total_profiles, 2);
    assert_eq!(stats.region_distribution[0].region, "North Atlantic");
    assert_eq!(stats.region_distribution[0].count, 2);
}

#[test]
fn refit_rewrites_stored_vectors() {
    let tmp = TempDir::new().unwrap();
    write_argo_file(tmp.path(), "a.nc", "100", &[north_atlantic_cast()]);
    write_argo_file(
        tmp.path(),
        "b.nc",
        "200",
        &[Cast::new(4, -30.0, 80.0, &[(12.0, 34.7, 50.0)])],
    );

    let mut pipeline = tfidf_pipeline();
    pipeline.process_directory(tmp.path()).unwrap();

    // The second summary's region was unknown to the first-fit vocabulary.
    let before = pipeline.semantic_search("South Pacific", 1);
    assert_eq!(before[0].similarity, 0.0);

    assert_eq!(pipeline.refit().unwrap(), 2);
    let after = pipeline.semantic_search("South Pacific", 1);
    assert_eq!(after[0].profile_id, "200_4");
    assert!(after[0].similarity > 0.0);

    let stored: String = pipeline
        .conn()
        .query_row("SELECT vector_embedding FROM profiles WHERE id = '200_4'", [], |r| r.get(0))
        .unwrap();
    let stored: Vec<f32> = serde_json::from_str(&stored).unwrap();
    assert_eq!(pipeline.index().vector("200_4"), Some(stored.as_slice()));
}

#[test]
fn classic_format_files_decode_like_netcdf4() {
    let tmp = TempDir::new().unwrap();
    write_classic_argo_file(tmp.path(), "classic.nc", "5904123", &[north_atlantic_cast()]);

    let mut pipeline = tfidf_pipeline();
    let report = pipeline.process_directory(tmp.path()).unwrap();
    assert_eq!(report.files_ingested, 1);
    assert_eq!(report.measurements, 2);
    assert_eq!(count_rows(pipeline.conn(), "profiles"), 1);
}

#[test]
fn forged_header_length_fails_only_that_file() {
    let tmp = TempDir::new().unwrap();
    let forged = write_classic_argo_file(tmp.path(), "a_forged.nc", "100", &[north_atlantic_cast()]);
    write_argo_file(tmp.path(), "b_valid.nc", "200", &[north_atlantic_cast()]);

    // First dimension record: N_PROF, name padded to 8 bytes; its length
    // sits at bytes 28..32 of a 64-bit-offset header.
    let mut bytes = std::fs::read(&forged).unwrap();
    assert_eq!(&bytes[..4], b"CDF\x02");
    assert_eq!(&bytes[20..26], b"N_PROF");
    bytes[28..32].copy_from_slice(&0x7FFF_FFFEu32.to_be_bytes());
    std::fs::write(&forged, bytes).unwrap();

    let mut pipeline = tfidf_pipeline();
    let report = pipeline.process_directory(tmp.path()).unwrap();

    assert_eq!(report.files_seen, 2);
    assert_eq!(report.files_failed, 1);
    assert_eq!(report.failures[0].kind, "decode");
    assert_eq!(report.files_ingested, 1);
    assert_eq!(pipeline.index().profile_ids().collect::<Vec<_>>(), ["200_1"]);
}

#[test]
fn oversized_grid_fails_only_that_file() {
    let tmp = TempDir::new().unwrap();
    {
        let mut file = netcdf::create(tmp.path().join("a_huge.nc")).unwrap();
        file.add_dimension("N_PROF", 100_000).unwrap();
        file.add_dimension("N_LEVELS", 1_000).unwrap();
    }
    write_argo_file(tmp.path(), "b_valid.nc", "200", &[north_atlantic_cast()]);

    let mut pipeline = tfidf_pipeline();
    let report = pipeline.process_directory(tmp.path()).unwrap();

    assert_eq!(report.files_failed, 1);
    assert!(report.failures[0].error.contains("exceeds"));
    assert_eq!(report.files_ingested, 1);
}

#[test]
fn store_failure_is_recorded_and_next_file_ingests() {
    let tmp = TempDir::new().unwrap();
    write_argo_file(tmp.path(), "a.nc", "666", &[north_atlantic_cast()]);
    write_argo_file(tmp.path(), "b.nc", "200", &[north_atlantic_cast()]);

    let mut pipeline = tfidf_pipeline();
    pipeline
        .conn()
        .execute_batch(
            "CREATE TRIGGER reject_platform BEFORE INSERT ON measurements
             WHEN NEW.platform_number = '666'
             BEGIN SELECT RAISE(ABORT, 'platform rejected'); END;",
        )
        .unwrap();
    let report = pipeline.process_directory(tmp.path()).unwrap();

    assert_eq!(report.files_failed, 1);
    assert_eq!(report.failures[0].kind, "store");
    assert!(report.failures[0].file.ends_with("a.nc"));
    assert!(report.failures[0].error.contains("platform rejected"));
    assert_eq!(report.files_ingested, 1);

    // the failed file left no rows behind
    assert_eq!(count_rows(pipeline.conn(), "measurements"), 2);
    assert_eq!(count_rows(pipeline.conn(), "profiles"), 1);
    assert_eq!(pipeline.index().profile_ids().collect::<Vec<_>>(), ["200_1"]);
}

#[test]
fn failed_write_back_leaves_index_untouched() {
    let tmp = TempDir::new().unwrap();
    let casts = [
        north_atlantic_cast(),
        Cast::new(2, 30.0, 150.0, &[(25.0, 34.0, 10.0)]),
    ];
    let path = write_argo_file(tmp.path(), "a.nc", "100", &casts);

    let mut pipeline = tfidf_pipeline();
    pipeline
        .conn()
        .execute_batch(
            "CREATE TRIGGER reject_embedding BEFORE UPDATE OF vector_embedding ON profiles
             WHEN NEW.cycle_number = 2
             BEGIN SELECT RAISE(ABORT, 'embedding rejected'); END;",
        )
        .unwrap();

    let outcome = pipeline.process_file(&path);
    assert!(matches!(outcome, FileOutcome::Failed(FileError::Index(_))));
    assert!(pipeline.index().is_empty());

    // rows stay committed, without a half-written embedding
    let stored: i64 = pipeline
        .conn()
        .query_row("SELECT COUNT(*) FROM profiles WHERE vector_embedding IS NOT NULL", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count_rows(pipeline.conn(), "profiles"), 2);
    assert_eq!(stored, 0);

    pipeline.conn().execute_batch("DROP TRIGGER reject_embedding").unwrap();
    assert!(matches!(
        pipeline.process_file(&path),
        FileOutcome::Ingested { profiles: 2, .. }
    ));
    assert_eq!(pipeline.index().profile_ids().collect::<Vec<_>>(), ["100_1", "100_2"]);
}
