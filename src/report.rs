use polars::datatypes::TimeUnit;
use polars::prelude::*;

use crate::aggregate::{aggregate, AggregatedSeries, Grid};
use crate::config::{ChartType, Period, Selection, ValueKind};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::OccupancyError;
use crate::schema::{series, utilization as util_cols};
use crate::table::OccupancyTable;
use crate::utilization::{utilization, Utilization};
use crate::window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityReport {
    pub entity: String,
    pub series: AggregatedSeries,
    pub capacity: Option<u64>,
    pub utilization: Utilization,
    pub peak: u64,
    /// False when the entity had no readings in the window; its series is
    /// then all zero and its chart is not drawn.
    pub has_data: bool,
}

/// Everything a dashboard needs to draw one view for one selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub view: View,
    pub period: Period,
    pub value_kind: ValueKind,
    pub chart_type: ChartType,
    /// Bucket labels shared by every entity's x-axis.
    pub labels: Vec<String>,
    pub entities: Vec<EntityReport>,
    /// Peak across entities rounded up to the next multiple of ten.
    pub y_axis_upper: u64,
    pub columns: usize,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether any selected entity had readings in the window.
    pub fn has_data(&self) -> bool {
        self.entities.iter().any(|e| e.has_data)
    }

    /// Entities with readings, the ones that get a chart.
    pub fn charted(&self) -> impl Iterator<Item = &EntityReport> {
        self.entities.iter().filter(|e| e.has_data)
    }

    pub fn entity(&self, entity: &str) -> Option<&EntityReport> {
        self.entities.iter().find(|e| e.entity == entity)
    }

    /// Long-format series table: one row per entity and bucket.
    pub fn series_frame(&self) -> Result<DataFrame, OccupancyError> {
        let mut entities = Vec::new();
        let mut labels = Vec::new();
        let mut starts = Vec::new();
        let mut values = Vec::new();
        for entity in &self.entities {
            for (bucket, value) in entity.series.iter() {
                entities.push(entity.entity.clone());
                labels.push(bucket.label.clone());
                starts.push(bucket.start.and_utc().timestamp_micros());
                values.push(value as i64);
            }
        }

        let starts = Int64Chunked::from_vec(series::BUCKET_START.into(), starts)
            .into_datetime(TimeUnit::Microseconds, None);
        Ok(DataFrame::new(vec![
            Column::new(series::ENTITY_ID.into(), entities),
            Column::new(series::BUCKET.into(), labels),
            starts.into_series().into(),
            Column::new(series::VALUE.into(), values),
        ])?)
    }

    /// One row per entity with capacity, peak and utilization.
    pub fn utilization_frame(&self) -> Result<DataFrame, OccupancyError> {
        let entities: Vec<String> = self.entities.iter().map(|e| e.entity.clone()).collect();
        let capacities: Vec<Option<i64>> = self
            .entities
            .iter()
            .map(|e| e.capacity.map(|c| c as i64))
            .collect();
        let peaks: Vec<i64> = self.entities.iter().map(|e| e.peak as i64).collect();
        let percents: Vec<f64> = self
            .entities
            .iter()
            .map(|e| e.utilization.percent)
            .collect();
        let has_data: Vec<bool> = self.entities.iter().map(|e| e.has_data).collect();

        Ok(DataFrame::new(vec![
            Column::new(util_cols::ENTITY_ID.into(), entities),
            Column::new(util_cols::CAPACITY.into(), capacities),
            Column::new(util_cols::PEAK.into(), peaks),
            Column::new(util_cols::PERCENT.into(), percents),
            Column::new(util_cols::HAS_DATA.into(), has_data),
        ])?)
    }
}

fn describe(period: &Period) -> String {
    match period {
        Period::Day(date) => date.to_string(),
        Period::Week(_) => format!("the week starting {}", period.first_day()),
    }
}

/// Run filter, aggregation and utilization for every selected entity.
///
/// The view follows the selection's period: a day gives hourly buckets,
/// a week gives one bucket per weekday. Every selected entity gets an
/// entry; one without readings in the window has a zero series.
pub fn build_report(
    table: &OccupancyTable,
    selection: &Selection,
    value_kind: ValueKind,
) -> Result<Report, OccupancyError> {
    selection.office_hours.validate()?;

    let period = selection.period;
    let view = if period.is_weekly() {
        View::Weekly
    } else {
        View::Daily
    };
    let grid = Grid::for_period(&period, &selection.office_hours);

    let mut report = Report {
        view,
        period,
        value_kind,
        chart_type: selection.chart_type,
        labels: grid.buckets().into_iter().map(|b| b.label).collect(),
        entities: Vec::new(),
        y_axis_upper: 10,
        columns: selection.layout.columns(selection.entity_ids.len()),
        diagnostics: Vec::new(),
    };

    let available = match view {
        View::Daily => table.available_dates()?,
        View::Weekly => table.available_week_starts()?,
    };
    if !available.contains(&period.first_day()) {
        report.diagnostics.push(Diagnostic::new(
            DiagnosticKind::NoData,
            format!("No data available for {}", describe(&period)),
        ));
        return Ok(report);
    }

    let capacities = table.capacities()?;
    for entity in &selection.entity_ids {
        let slice = window::filter(table, entity, &period, &selection.office_hours)?;
        let has_data = !slice.is_empty();
        if !has_data {
            report.diagnostics.push(Diagnostic::new(
                DiagnosticKind::NoData,
                format!(
                    "No data available for {entity} in {} during office hours",
                    describe(&period)
                ),
            ));
        }

        let series = aggregate(&slice, &grid, selection.reducer)?;
        let capacity = capacities.get(entity.as_str()).copied();
        let utilization = utilization(&series, capacity, value_kind);
        if utilization.flagged && has_data {
            report.diagnostics.push(Diagnostic::new(
                DiagnosticKind::ZeroCapacity,
                format!("Capacity for {entity} is missing or zero. Utilization set to 0%."),
            ));
        }
        log::debug!(
            "{entity}: peak {} utilization {:.2}% over {} buckets",
            series.peak(),
            utilization.percent,
            series.len()
        );

        report.entities.push(EntityReport {
            entity: entity.clone(),
            peak: series.peak(),
            series,
            capacity,
            utilization,
            has_data,
        });
    }

    if !report.has_data() {
        report.diagnostics.push(Diagnostic::new(
            DiagnosticKind::NoData,
            "No data available for the selected filters.",
        ));
    }

    let max_peak = report.entities.iter().map(|e| e.peak).max().unwrap_or(0);
    report.y_axis_upper = (max_peak / 10 + 1) * 10;
    Ok(report)
}
