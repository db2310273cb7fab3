use chrono::{Duration, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Deserialize;

use crate::config::{OfficeHours, Period};
use crate::error::OccupancyError;
use crate::schema::{occupancy, BUCKET_KEY};
use crate::table::OccupancyTable;
use crate::time::days_since_epoch;

/// How the readings that land in one bucket are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    /// Peak reading, the default.
    #[default]
    Max,
    Sum,
}

impl Reducer {
    fn expr(&self, e: Expr) -> Expr {
        match self {
            Reducer::Max => e.max(),
            Reducer::Sum => e.sum(),
        }
    }
}

/// Fixed sequence of buckets an aggregated series is aligned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grid {
    /// One bucket per hour of `office_hours` on `date`.
    Hourly {
        date: NaiveDate,
        office_hours: OfficeHours,
    },
    /// One bucket per day, Monday to Friday.
    Weekday { monday: NaiveDate },
}

impl Grid {
    pub fn for_period(period: &Period, office_hours: &OfficeHours) -> Self {
        match period {
            Period::Day(date) => Grid::Hourly {
                date: *date,
                office_hours: *office_hours,
            },
            Period::Week(_) => Grid::Weekday {
                monday: period.first_day(),
            },
        }
    }

    pub fn buckets(&self) -> Vec<Bucket> {
        match self {
            Grid::Hourly { date, office_hours } => office_hours
                .hour_starts()
                .into_iter()
                .map(|t| Bucket::new(date.and_time(t), "%H:%M"))
                .collect(),
            Grid::Weekday { monday } => (0..5)
                .filter_map(|offset| monday.checked_add_signed(Duration::days(offset)))
                .filter_map(|d| d.and_hms_opt(0, 0, 0))
                .map(|start| Bucket::new(start, "%A"))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.buckets().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keeps rows dated on one of the grid's days.
    fn covers(&self) -> Expr {
        let day = col(occupancy::LOCAL_DATE).cast(DataType::Int32);
        match self {
            Grid::Hourly { date, .. } => day.eq(lit(days_since_epoch(*date))),
            Grid::Weekday { monday } => {
                let first = days_since_epoch(*monday);
                day.clone().gt_eq(lit(first)).and(day.lt_eq(lit(first + 4)))
            }
        }
    }

    /// Zero-based bucket index of a row.
    fn key(&self) -> Expr {
        match self {
            Grid::Hourly { office_hours, .. } => (col(occupancy::SECOND_OF_DAY)
                - lit(office_hours.open_second()))
            .floor_div(lit(3600)),
            Grid::Weekday { monday } => {
                col(occupancy::LOCAL_DATE).cast(DataType::Int32) - lit(days_since_epoch(*monday))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub start: NaiveDateTime,
    pub label: String,
}

impl Bucket {
    fn new(start: NaiveDateTime, label_format: &str) -> Self {
        Self {
            start,
            label: start.format(label_format).to_string(),
        }
    }
}

/// Gap-free series, one value per grid bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatedSeries {
    buckets: Vec<Bucket>,
    values: Vec<u64>,
}

impl AggregatedSeries {
    /// Series over `buckets` with every value zero.
    pub fn zeros(buckets: Vec<Bucket>) -> Self {
        let values = vec![0; buckets.len()];
        Self { buckets, values }
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(|b| b.label.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Bucket, u64)> {
        self.buckets.iter().zip(self.values.iter().copied())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn peak(&self) -> u64 {
        self.values.iter().copied().max().unwrap_or(0)
    }

    /// Saturates at `u64::MAX`.
    pub fn sum(&self) -> u64 {
        self.values
            .iter()
            .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.values.iter().map(|v| *v as f64).sum::<f64>() / self.values.len() as f64
        }
    }
}

/// Combine the rows of `table` per grid bucket and reindex onto the full grid.
///
/// Buckets without rows (or with only null counts) are 0. Rows whose key
/// falls outside the grid are ignored.
pub fn aggregate(
    table: &OccupancyTable,
    grid: &Grid,
    reducer: Reducer,
) -> Result<AggregatedSeries, OccupancyError> {
    let mut series = AggregatedSeries::zeros(grid.buckets());

    let grouped = table
        .frame()
        .clone()
        .lazy()
        .filter(grid.covers())
        .select([grid.key().alias(BUCKET_KEY), col(occupancy::COUNT)])
        .filter(col(BUCKET_KEY).is_not_null())
        .group_by([col(BUCKET_KEY)])
        .agg([reducer.expr(col(occupancy::COUNT)).alias(occupancy::COUNT)])
        .select([
            col(BUCKET_KEY).cast(DataType::Int64),
            col(occupancy::COUNT).cast(DataType::Int64),
        ])
        .collect()?;

    let keys = grouped.column(BUCKET_KEY)?.as_materialized_series().i64()?;
    let values = grouped
        .column(occupancy::COUNT)?
        .as_materialized_series()
        .i64()?;

    for (key, value) in keys.into_iter().zip(values.into_iter()) {
        let (Some(key), Some(value)) = (key, value) else {
            continue;
        };
        let Ok(index) = usize::try_from(key) else {
            continue;
        };
        if let Some(slot) = series.values.get_mut(index) {
            *slot = value.max(0) as u64;
        }
    }

    Ok(series)
}
