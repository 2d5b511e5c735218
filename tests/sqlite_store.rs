//! Imports into the SQLite-backed store.
//!
//! Run with: `cargo test --features persistence --test sqlite_store`

use std::io::{Cursor, Write};

use serde_json::json;
use tempfile::TempDir;
use tracklog_import::{
    Breadcrumb, BreadcrumbSink, ImportOptions, InputFile, MemoryStore, RecordingMetadata,
    RecordingStore, SplitTarget, SqliteStore, TracklogImporter,
};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

fn build_archive(entries: &[(&str, Vec<u8>)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start entry");
        writer.write_all(data).expect("write entry");
    }
    writer.finish().expect("finish archive").into_inner()
}

fn walk_archive() -> InputFile {
    let tracklog = json!({
        "sessionId": "walk-7",
        "breadcrumbs": [
            {"lat": 45.0, "lng": 7.0, "timestamp": 1_000, "isMoving": true},
            {"lat": 45.001, "lng": 7.0, "timestamp": 61_000, "isMoving": true}
        ]
    });
    let metadata = json!({
        "uniqueId": "rec-1",
        "filename": "rec-1.webm",
        "timestamp": "2024-05-05T05:05:05.000Z",
        "duration": 3.0,
        "location": {"lat": 45.0, "lng": 7.0},
        "speciesTags": [],
        "notes": ""
    });
    InputFile::new(
        "walk.zip",
        build_archive(&[
            ("tracklog/tracklog.json", tracklog.to_string().into_bytes()),
            ("export_summary.json", b"{}".to_vec()),
            ("audio/rec-1.webm", b"OggS-audio".to_vec()),
            ("metadata/rec-1_metadata.json", metadata.to_string().into_bytes()),
        ]),
    )
}

fn temp_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("imports.db");
    let store = SqliteStore::new(path.to_str().expect("utf-8 path")).expect("open store");
    (dir, store)
}

#[test]
fn test_archive_import_persists_to_sqlite() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (_dir, store) = temp_store();

    let mut importer = TracklogImporter::new(store);
    let summary = importer
        .import_from_archive(&walk_archive(), &ImportOptions::default())
        .unwrap();
    assert_eq!(summary.imported_recordings, 1);
    assert_eq!(summary.imported_breadcrumbs, 2);

    let store = importer.into_target();
    assert_eq!(store.recording_count().unwrap(), 1);

    let new_id = &summary.recordings[0].new_id;
    assert!(new_id.starts_with("recording-"));
    let (metadata, audio) = store.recording(new_id).unwrap().unwrap();
    assert_eq!(metadata.unique_id, "rec-1");
    assert_eq!(audio, b"OggS-audio");

    let breadcrumbs = store.session_breadcrumbs(&summary.new_session_id).unwrap();
    assert_eq!(breadcrumbs.len(), 2);
    assert_eq!(breadcrumbs[0].timestamp, 1_000);
    assert_eq!(breadcrumbs[1].timestamp, 61_000);
    assert!(breadcrumbs.iter().all(|b| b.imported));
    assert_eq!(breadcrumbs[0].original_session_id.as_deref(), Some("walk-7"));
}

#[test]
fn test_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("imports.db");
    let path = path.to_str().unwrap();

    let session_id = {
        let mut importer = TracklogImporter::new(SqliteStore::new(path).unwrap());
        importer
            .import_from_archive(&walk_archive(), &ImportOptions::default())
            .unwrap()
            .new_session_id
    };

    let reopened = SqliteStore::new(path).unwrap();
    assert_eq!(reopened.recording_count().unwrap(), 1);
    assert_eq!(reopened.session_breadcrumbs(&session_id).unwrap().len(), 2);
}

#[test]
fn test_sessions_are_kept_apart() {
    let mut importer = TracklogImporter::new(SqliteStore::in_memory().unwrap());
    let first = importer
        .import_from_archive(&walk_archive(), &ImportOptions::default())
        .unwrap();
    let second = importer
        .import_from_archive(&walk_archive(), &ImportOptions::default())
        .unwrap();

    let store = importer.target();
    assert_eq!(store.imported_breadcrumbs().unwrap().len(), 4);
    assert_eq!(store.session_breadcrumbs(&first.new_session_id).unwrap().len(), 2);
    assert_eq!(store.session_breadcrumbs(&second.new_session_id).unwrap().len(), 2);
    assert_eq!(store.recording_count().unwrap(), 2);
    assert_ne!(first.recordings[0].new_id, second.recordings[0].new_id);
}

#[test]
fn test_sqlite_rejects_empty_audio() {
    let mut store = SqliteStore::in_memory().unwrap();
    let metadata = RecordingMetadata::synthesized("rec-1", "rec-1.webm");
    assert!(store.save(&metadata, &[]).is_err());
    assert_eq!(store.recording_count().unwrap(), 0);
}

#[test]
fn test_split_target_routes_recordings_and_breadcrumbs() {
    let target = SplitTarget {
        recordings: MemoryStore::new(),
        breadcrumbs: SqliteStore::in_memory().unwrap(),
    };
    let mut importer = TracklogImporter::new(target);
    let summary = importer
        .import_from_archive(&walk_archive(), &ImportOptions::default())
        .unwrap();

    let target = importer.into_target();
    assert_eq!(target.recordings.recordings().len(), 1);
    assert!(target.recordings.imported_breadcrumbs().is_empty());
    assert_eq!(
        target
            .breadcrumbs
            .session_breadcrumbs(&summary.new_session_id)
            .unwrap()
            .len(),
        2
    );
}

#[test]
fn test_direct_append() {
    let mut store = SqliteStore::in_memory().unwrap();
    let crumb: Breadcrumb =
        serde_json::from_value(json!({"lat": 1.0, "lng": 2.0, "timestamp": 3})).unwrap();
    store.append("s-1", &[crumb.clone(), crumb]).unwrap();
    assert_eq!(store.session_breadcrumbs("s-1").unwrap().len(), 2);
    assert!(store.session_breadcrumbs("s-2").unwrap().is_empty());
}
