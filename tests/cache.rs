mod common;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use occupancy_lens::{load, ColumnMap, SourceSet, TableCache};

use common::write_floor_csv;

#[test]
fn repeated_load_is_served_from_cache() {
    let dir = tempfile::tempdir().unwrap();
    write_floor_csv(dir.path(), "a.csv", &["Level 1,2024-05-06,9,0,4,20"]);
    let sources = SourceSet::directory(dir.path()).unwrap();
    let columns = ColumnMap::floor_export();

    let mut cache = TableCache::new();
    let first = cache.get_or_load(&sources, &columns).unwrap();
    let second = cache.get_or_load(&sources, &columns).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);
    assert_eq!(first.table, load(&sources, &columns).unwrap().table);
}

#[test]
fn modified_file_replaces_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_floor_csv(dir.path(), "a.csv", &["Level 1,2024-05-06,9,0,4,20"]);
    let sources = SourceSet::files([path.clone()]);
    let columns = ColumnMap::floor_export();

    let mut cache = TableCache::new();
    let before = cache.get_or_load(&sources, &columns).unwrap();
    assert_eq!(before.table.height(), 1);

    write_floor_csv(
        dir.path(),
        "a.csv",
        &["Level 1,2024-05-06,9,0,4,20", "Level 1,2024-05-06,10,0,6,20"],
    );
    let later = SystemTime::now() + Duration::from_secs(120);
    filetime::set_file_mtime(&path, filetime::FileTime::from_system_time(later)).unwrap();

    let after = cache.get_or_load(&sources, &columns).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.table.height(), 2);
    assert_eq!(cache.len(), 1);
    // the earlier handle still sees the table it was given
    assert_eq!(before.table.height(), 1);
}

#[test]
fn different_column_maps_are_cached_separately() {
    let dir = tempfile::tempdir().unwrap();
    write_floor_csv(dir.path(), "a.csv", &["Level 1,2024-05-06,9,0,1,20"]);
    let sources = SourceSet::directory(dir.path()).unwrap();

    let mut cache = TableCache::new();
    cache.get_or_load(&sources, &ColumnMap::floor_export()).unwrap();
    cache
        .get_or_load(
            &sources,
            &ColumnMap::floor_export().with_value_kind(occupancy_lens::ValueKind::Presence),
        )
        .unwrap();
    assert_eq!(cache.len(), 2);

    cache.invalidate(&sources, &ColumnMap::floor_export());
    assert_eq!(cache.len(), 1);
    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn directory_gaining_a_file_replaces_entry() {
    let dir = tempfile::tempdir().unwrap();
    write_floor_csv(dir.path(), "a.csv", &["Level 1,2024-05-06,9,0,4,20"]);
    let columns = ColumnMap::floor_export();

    let mut cache = TableCache::new();
    let before = SourceSet::directory(dir.path()).unwrap();
    assert_eq!(cache.get_or_load(&before, &columns).unwrap().table.height(), 1);

    write_floor_csv(dir.path(), "b.csv", &["Level 2,2024-05-06,9,0,6,20"]);
    let after = SourceSet::directory(dir.path()).unwrap();
    assert_eq!(cache.get_or_load(&after, &columns).unwrap().table.height(), 2);
    assert_eq!(cache.len(), 1);

    std::fs::remove_file(dir.path().join("a.csv")).unwrap();
    let shrunk = SourceSet::directory(dir.path()).unwrap();
    assert_eq!(cache.get_or_load(&shrunk, &columns).unwrap().table.height(), 1);
    assert_eq!(cache.len(), 1);
}

#[test]
fn unrelated_directories_are_kept() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_floor_csv(first.path(), "a.csv", &["Level 1,2024-05-06,9,0,4,20"]);
    write_floor_csv(second.path(), "a.csv", &["Level 2,2024-05-06,9,0,4,20"]);
    let columns = ColumnMap::floor_export();

    let mut cache = TableCache::new();
    cache
        .get_or_load(&SourceSet::directory(first.path()).unwrap(), &columns)
        .unwrap();
    cache
        .get_or_load(&SourceSet::directory(second.path()).unwrap(), &columns)
        .unwrap();
    assert_eq!(cache.len(), 2);
}
