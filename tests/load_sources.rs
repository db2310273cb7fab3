mod common;

use std::fs;

use occupancy_lens::diagnostics::has_kind;
use occupancy_lens::{load, ColumnMap, DiagnosticKind, OccupancyError, SourceSet};

use common::write_floor_csv;

#[test]
fn directory_loads_every_csv_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    write_floor_csv(dir.path(), "b.csv", &["Level 2,2024-05-07,10,0,8,40"]);
    write_floor_csv(dir.path(), "a.csv", &["Level 1,2024-05-06,9,30,4,20"]);
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let sources = SourceSet::directory(dir.path()).unwrap();
    assert_eq!(sources.len(), 2);

    let loaded = load(&sources, &ColumnMap::floor_export()).unwrap();
    assert_eq!(loaded.table.height(), 2);
    assert_eq!(loaded.table.entities().unwrap(), ["Level 1", "Level 2"]);
    assert!(loaded.diagnostics.is_empty());
    assert_eq!(loaded.table.capacity_of("Level 2").unwrap(), Some(40));
}

#[test]
fn unreadable_file_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_floor_csv(dir.path(), "good.csv", &["Level 1,2024-05-06,9,0,4,20"]);
    let bad = dir.path().join("bad.csv");
    fs::write(&bad, "Something,Else\n1,2\n").unwrap();

    let loaded = load(&SourceSet::files([bad, good]), &ColumnMap::floor_export()).unwrap();
    assert_eq!(loaded.table.height(), 1);
    assert_eq!(loaded.sources.len(), 1);
    assert!(has_kind(&loaded.diagnostics, DiagnosticKind::SkippedSource));
}

#[test]
fn every_file_failing_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let bad = dir.path().join("bad.csv");
    fs::write(&bad, "Something,Else\n1,2\n").unwrap();
    let missing = dir.path().join("missing.csv");

    let err = load(&SourceSet::files([bad, missing]), &ColumnMap::floor_export()).unwrap_err();
    assert!(matches!(err, OccupancyError::AllSourcesFailed(2)));
}

#[test]
fn bad_rows_are_reported_once_per_kind() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_floor_csv(
        dir.path(),
        "rows.csv",
        &[
            "Level 1,2024-05-06,9,0,4,20",
            "Level 1,not a date,9,15,5,20",
            "Level 1,yesterday,9,30,6,20",
            "Level 1,2024-05-06,9,45,,20",
        ],
    );

    let loaded = load(&SourceSet::files([path]), &ColumnMap::floor_export()).unwrap();
    assert_eq!(loaded.table.height(), 4);
    let unparseable = loaded
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::UnparseableRows)
        .count();
    assert_eq!(unparseable, 2);
}
