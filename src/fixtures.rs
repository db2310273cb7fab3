//! In-memory tables for unit tests.

use chrono::NaiveDate;
use polars::prelude::*;

use crate::config::{ColumnMap, TimeLayout, ValueKind};
use crate::loader::normalize;
use crate::table::OccupancyTable;

pub(crate) struct Row {
    entity: &'static str,
    floor: Option<&'static str>,
    date: &'static str,
    time: &'static str,
    count: &'static str,
    capacity: &'static str,
}

impl Row {
    pub(crate) fn new(
        entity: &'static str,
        date: &'static str,
        time: &'static str,
        count: &'static str,
    ) -> Self {
        Self {
            entity,
            floor: None,
            date,
            time,
            count,
            capacity: "20",
        }
    }

    pub(crate) fn capacity(mut self, capacity: &'static str) -> Self {
        self.capacity = capacity;
        self
    }

    pub(crate) fn floor(mut self, floor: &'static str) -> Self {
        self.floor = Some(floor);
        self
    }
}

pub(crate) fn columns() -> ColumnMap {
    ColumnMap {
        entity: "Room".to_string(),
        floor: Some("Floor".to_string()),
        date: "Date".to_string(),
        time: TimeLayout::Clock {
            column: "Time".to_string(),
        },
        value: "Count".to_string(),
        value_kind: ValueKind::Count,
        capacity: Some("Capacity".to_string()),
    }
}

fn text(values: Vec<&str>) -> Vec<Option<String>> {
    values
        .into_iter()
        .map(|v| Some(v.to_string()).filter(|s| !s.is_empty()))
        .collect()
}

pub(crate) fn table(rows: &[Row]) -> OccupancyTable {
    let raw = DataFrame::new(vec![
        Column::new("Room".into(), text(rows.iter().map(|r| r.entity).collect())),
        Column::new(
            "Floor".into(),
            text(rows.iter().map(|r| r.floor.unwrap_or("")).collect()),
        ),
        Column::new("Date".into(), text(rows.iter().map(|r| r.date).collect())),
        Column::new("Time".into(), text(rows.iter().map(|r| r.time).collect())),
        Column::new("Count".into(), text(rows.iter().map(|r| r.count).collect())),
        Column::new(
            "Capacity".into(),
            text(rows.iter().map(|r| r.capacity).collect()),
        ),
    ])
    .unwrap();
    let (df, _) = normalize(&raw, &columns()).unwrap();
    OccupancyTable::new(df)
}

pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
