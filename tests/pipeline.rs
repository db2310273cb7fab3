mod common;

use std::fs;

use occupancy_lens::config::read_config;
use occupancy_lens::{
    build_report, load, to_delimited, utilization_records, ColumnMap, DiagnosticKind, Period,
    Selection, SourceSet, ValueKind, View,
};

use chrono::NaiveDate;
use common::write_floor_csv;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
}

#[test]
fn daily_report_exports_average_utilization() {
    let dir = tempfile::tempdir().unwrap();
    write_floor_csv(
        dir.path(),
        "floors.csv",
        &[
            "Level 1,2024-05-06,9,0,6,20",
            "Level 1,2024-05-06,9,30,18,20",
            "Level 1,2024-05-06,8,0,40,20",
            "Level 2,2024-05-06,12,0,5,0",
        ],
    );
    let loaded = load(
        &SourceSet::directory(dir.path()).unwrap(),
        &ColumnMap::floor_export(),
    )
    .unwrap();

    let selection = Selection::new(
        vec!["Level 1".into(), "Level 2".into()],
        Period::Day(monday()),
    );
    let report = build_report(&loaded.table, &selection, ValueKind::Count).unwrap();
    assert_eq!(report.view, View::Daily);

    let level1 = report.entity("Level 1").unwrap();
    assert_eq!(level1.series.values()[0], 18);
    assert_eq!(level1.peak, 18);
    assert_eq!(report.y_axis_upper, 20);

    let csv = String::from_utf8(to_delimited(&utilization_records(&report)).unwrap()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("Floor/Room,Average Utilization (%)"));
    assert_eq!(lines.next(), Some("Level 1,10.0"));
    assert_eq!(lines.next(), Some("Level 2,0.0"));
    assert_eq!(lines.next(), None);
    assert!(report
        .diagnostics
        .iter()
        .any(|d| d.kind == DiagnosticKind::ZeroCapacity));
}

#[test]
fn presence_data_exports_usage() {
    let dir = tempfile::tempdir().unwrap();
    write_floor_csv(
        dir.path(),
        "desks.csv",
        &[
            "Desk 1,2024-05-06,9,0,1,1",
            "Desk 1,2024-05-08,11,0,1,1",
            "Desk 1,2024-05-09,11,0,0,1",
        ],
    );
    let columns = ColumnMap::floor_export().with_value_kind(ValueKind::Presence);
    let loaded = load(&SourceSet::directory(dir.path()).unwrap(), &columns).unwrap();

    let selection = Selection::new(vec!["Desk 1".into()], Period::week(monday()));
    let report = build_report(&loaded.table, &selection, columns.value_kind).unwrap();
    assert_eq!(report.view, View::Weekly);
    assert_eq!(report.entity("Desk 1").unwrap().series.values(), &[1, 0, 1, 0, 0]);

    let csv = String::from_utf8(to_delimited(&utilization_records(&report)).unwrap()).unwrap();
    assert_eq!(csv, "Floor/Room,Usage (%)\nDesk 1,40.0\n");
}

#[test]
fn run_file_drives_a_report() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    write_floor_csv(&data, "floors.csv", &["Level 1,2024-05-08,10,0,7,10"]);
    let run_file = dir.path().join("run.toml");
    fs::write(
        &run_file,
        r#"
[sources]
directory = "data"

[columns]
preset = "floor"

[selection]
entity_ids = ["Level 1"]
period = { week = "2024-05-08" }

[output]
export_path = "out/utilization.csv"
"#,
    )
    .unwrap();

    let config = read_config(&run_file).unwrap();
    assert_eq!(config.output.export_path, dir.path().join("out/utilization.csv"));

    let columns = config.columns.resolve().unwrap();
    let sources = SourceSet::directory(config.sources.directory.as_ref().unwrap()).unwrap();
    let loaded = load(&sources, &columns).unwrap();
    let report = build_report(&loaded.table, &config.selection, columns.value_kind).unwrap();

    let level1 = report.entity("Level 1").unwrap();
    assert_eq!(level1.series.values(), &[0, 0, 7, 0, 0]);
    assert!((level1.utilization.percent - 14.0).abs() < 1e-9);
}
