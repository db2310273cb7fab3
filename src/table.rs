use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::OccupancyError;
use crate::schema::occupancy;
use crate::time::from_days_since_epoch;

/// Normalized occupancy observations, one row per source row.
///
/// Column layout is fixed by [`crate::schema::occupancy`]. The table is
/// never mutated after loading; filters return new tables.
#[derive(Debug, Clone)]
pub struct OccupancyTable {
    frame: DataFrame,
}

impl OccupancyTable {
    pub(crate) fn new(frame: DataFrame) -> Self {
        Self { frame }
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    /// Distinct entity ids in first-occurrence order.
    pub fn entities(&self) -> Result<Vec<String>, OccupancyError> {
        self.distinct_strings(occupancy::ENTITY_ID)
    }

    pub fn floors(&self) -> Result<Vec<String>, OccupancyError> {
        self.distinct_strings(occupancy::FLOOR_ID)
    }

    /// Entities grouped under their floor. Entities without a floor are left out.
    pub fn entities_by_floor(&self) -> Result<BTreeMap<String, Vec<String>>, OccupancyError> {
        let entities = self.frame.column(occupancy::ENTITY_ID)?.str()?;
        let floors = self.frame.column(occupancy::FLOOR_ID)?.str()?;

        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut seen = HashSet::new();
        for (entity, floor) in entities.into_iter().zip(floors.into_iter()) {
            let (Some(entity), Some(floor)) = (entity, floor) else {
                continue;
            };
            if seen.insert((floor, entity)) {
                grouped
                    .entry(floor.to_string())
                    .or_default()
                    .push(entity.to_string());
            }
        }
        Ok(grouped)
    }

    /// Sorted distinct dates that have at least one row.
    pub fn available_dates(&self) -> Result<Vec<NaiveDate>, OccupancyError> {
        self.distinct_dates(occupancy::LOCAL_DATE)
    }

    /// Sorted distinct week-start Mondays.
    pub fn available_week_starts(&self) -> Result<Vec<NaiveDate>, OccupancyError> {
        self.distinct_dates(occupancy::WEEK_START)
    }

    /// First non-null capacity seen for each entity.
    pub fn capacities(&self) -> Result<HashMap<String, u64>, OccupancyError> {
        let entities = self.frame.column(occupancy::ENTITY_ID)?.str()?;
        let capacities = self
            .frame
            .column(occupancy::CAPACITY)?
            .as_materialized_series()
            .i64()?;

        let mut first: HashMap<String, u64> = HashMap::new();
        for (entity, capacity) in entities.into_iter().zip(capacities.into_iter()) {
            if let (Some(entity), Some(capacity)) = (entity, capacity) {
                if !first.contains_key(entity) {
                    first.insert(entity.to_string(), capacity.max(0) as u64);
                }
            }
        }
        Ok(first)
    }

    pub fn capacity_of(&self, entity: &str) -> Result<Option<u64>, OccupancyError> {
        Ok(self.capacities()?.get(entity).copied())
    }

    fn distinct_strings(&self, column: &str) -> Result<Vec<String>, OccupancyError> {
        let values = self.frame.column(column)?.str()?;
        let mut seen = HashSet::new();
        Ok(values
            .into_iter()
            .flatten()
            .filter(|v| seen.insert(*v))
            .map(str::to_string)
            .collect())
    }

    fn distinct_dates(&self, column: &str) -> Result<Vec<NaiveDate>, OccupancyError> {
        let days = self.frame.column(column)?.cast(&DataType::Int32)?;
        let days: BTreeSet<i32> = days
            .as_materialized_series()
            .i32()?
            .into_iter()
            .flatten()
            .collect();
        Ok(days.into_iter().map(from_days_since_epoch).collect())
    }
}

impl PartialEq for OccupancyTable {
    fn eq(&self, other: &Self) -> bool {
        self.frame.equals_missing(&other.frame)
    }
}
