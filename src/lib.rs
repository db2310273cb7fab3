pub mod aggregate;
pub mod cache;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod loader;
pub mod logger;
pub mod report;
pub mod schema;
pub mod table;
pub mod time;
pub mod utilization;
pub mod window;

#[cfg(test)]
mod fixtures;
#[cfg(feature = "python")]
mod python;

pub use aggregate::{aggregate, AggregatedSeries, Bucket, Grid, Reducer};
pub use cache::TableCache;
pub use config::{
    ChartType, ColumnMap, Layout, OfficeHours, Period, Selection, TimeLayout, ValueKind,
};
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::OccupancyError;
pub use export::{to_delimited, utilization_records, FlatRecord};
pub use loader::{load, Loaded, SourceSet};
pub use report::{build_report, EntityReport, Report, View};
pub use table::OccupancyTable;
pub use utilization::{count_utilization, presence_utilization, utilization, Utilization};
pub use window::filter;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Export schema constants as Python submodules
#[cfg(feature = "python")]
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Occupancy table
    let occupancy = PyModule::new(m.py(), "occupancy")?;
    occupancy.add("ENTITY_ID", schema::occupancy::ENTITY_ID)?;
    occupancy.add("FLOOR_ID", schema::occupancy::FLOOR_ID)?;
    occupancy.add("LOCAL_DATE", schema::occupancy::LOCAL_DATE)?;
    occupancy.add("WEEK_START", schema::occupancy::WEEK_START)?;
    occupancy.add("TIMESTAMP", schema::occupancy::TIMESTAMP)?;
    occupancy.add("SECOND_OF_DAY", schema::occupancy::SECOND_OF_DAY)?;
    occupancy.add("COUNT", schema::occupancy::COUNT)?;
    occupancy.add("CAPACITY", schema::occupancy::CAPACITY)?;
    m.add_submodule(&occupancy)?;

    // Series
    let series = PyModule::new(m.py(), "series")?;
    series.add("ENTITY_ID", schema::series::ENTITY_ID)?;
    series.add("BUCKET", schema::series::BUCKET)?;
    series.add("BUCKET_START", schema::series::BUCKET_START)?;
    series.add("VALUE", schema::series::VALUE)?;
    m.add_submodule(&series)?;

    // Utilization
    let utilization = PyModule::new(m.py(), "utilization")?;
    utilization.add("ENTITY_ID", schema::utilization::ENTITY_ID)?;
    utilization.add("CAPACITY", schema::utilization::CAPACITY)?;
    utilization.add("PEAK", schema::utilization::PEAK)?;
    utilization.add("PERCENT", schema::utilization::PERCENT)?;
    utilization.add("HAS_DATA", schema::utilization::HAS_DATA)?;
    m.add_submodule(&utilization)?;

    Ok(())
}

#[cfg(feature = "python")]
#[pymodule]
fn occupancy_lens(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<python::OccupancyModel>()?;
    m.add_class::<python::PyReport>()?;
    add_schema_exports(m)?;
    Ok(())
}
