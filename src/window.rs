use polars::prelude::*;

use crate::config::{OfficeHours, Period};
use crate::error::OccupancyError;
use crate::schema::occupancy;
use crate::table::OccupancyTable;
use crate::time::days_since_epoch;

/// Rows of `entity` dated inside `period` whose time of day falls within
/// `office_hours`, both ends inclusive.
///
/// The period is applied first and the time-of-day window runs over the
/// whole multi-day slice. Rows with a null date or timestamp never match.
/// An unknown entity gives an empty table.
pub fn filter(
    table: &OccupancyTable,
    entity: &str,
    period: &Period,
    office_hours: &OfficeHours,
) -> Result<OccupancyTable, OccupancyError> {
    let first = days_since_epoch(period.first_day());
    let last = days_since_epoch(period.last_day());
    let day = col(occupancy::LOCAL_DATE).cast(DataType::Int32);

    let df = table
        .frame()
        .clone()
        .lazy()
        .filter(
            col(occupancy::ENTITY_ID)
                .eq(lit(entity))
                .and(day.clone().gt_eq(lit(first)))
                .and(day.lt_eq(lit(last))),
        )
        .filter(
            col(occupancy::SECOND_OF_DAY)
                .gt_eq(lit(office_hours.open_second()))
                .and(col(occupancy::SECOND_OF_DAY).lt_eq(lit(office_hours.close_second()))),
        )
        .collect()?;

    Ok(OccupancyTable::new(df))
}
