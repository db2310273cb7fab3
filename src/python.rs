use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use pyo3::prelude::*;
use pyo3::types::PyBytes;
use pyo3_polars::PyDataFrame;

use crate::cache::TableCache;
use crate::config::{ChartType, ColumnMap, Layout, OfficeHours, Period, Selection, ValueKind};
use crate::diagnostics::Diagnostic;
use crate::error::OccupancyError;
use crate::export::{to_delimited, utilization_records};
use crate::loader::{Loaded, SourceSet};
use crate::report::{build_report, Report};

fn diagnostics_to_tuples(diagnostics: &[Diagnostic]) -> Vec<(String, String)> {
    diagnostics
        .iter()
        .map(|d| (d.kind.as_str().to_string(), d.message.clone()))
        .collect()
}

#[pyclass]
pub struct OccupancyModel {
    base_path: PathBuf,
    columns: ColumnMap,
    cache: TableCache,
    loaded: Option<Arc<Loaded>>,
}

#[pymethods]
impl OccupancyModel {
    #[new]
    #[pyo3(signature = (base_path, preset="floor", presence=false))]
    fn new(base_path: String, preset: &str, presence: bool) -> PyResult<Self> {
        let mut columns = ColumnMap::preset(preset)?;
        if presence {
            columns = columns.with_value_kind(ValueKind::Presence);
        }
        Ok(Self {
            base_path: PathBuf::from(base_path),
            columns,
            cache: TableCache::new(),
            loaded: None,
        })
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load every CSV/XLSX file in a directory (relative to base_path).
    ///
    /// Unchanged files are served from the cache.
    #[pyo3(signature = (directory=None))]
    fn load_directory(&mut self, directory: Option<&str>) -> PyResult<PyDataFrame> {
        let dir = match directory {
            Some(d) => self.base_path.join(d),
            None => self.base_path.clone(),
        };
        let sources = SourceSet::directory(&dir)?;
        self.load(&sources)
    }

    /// Load the given files (relative to base_path) in order.
    fn load_files(&mut self, filenames: Vec<String>) -> PyResult<PyDataFrame> {
        let sources = SourceSet::files(filenames.iter().map(|f| self.base_path.join(f)));
        self.load(&sources)
    }

    // ── Selection helpers ──────────────────────────────────────────────────

    fn entities(&self) -> PyResult<Vec<String>> {
        Ok(self.loaded()?.table.entities()?)
    }

    fn floors(&self) -> PyResult<Vec<String>> {
        Ok(self.loaded()?.table.floors()?)
    }

    /// Rooms grouped under their floor, for room-level exports.
    fn entities_by_floor(&self) -> PyResult<BTreeMap<String, Vec<String>>> {
        Ok(self.loaded()?.table.entities_by_floor()?)
    }

    fn available_dates(&self) -> PyResult<Vec<NaiveDate>> {
        Ok(self.loaded()?.table.available_dates()?)
    }

    fn available_weeks(&self) -> PyResult<Vec<NaiveDate>> {
        Ok(self.loaded()?.table.available_week_starts()?)
    }

    // ── Reports ────────────────────────────────────────────────────────────

    /// Hourly peaks and utilization for `entities` on `date`.
    #[pyo3(signature = (entities, date, chart_type="bar", layout="focus", office_open=None, office_close=None))]
    fn daily_report(
        &self,
        entities: Vec<String>,
        date: NaiveDate,
        chart_type: &str,
        layout: &str,
        office_open: Option<NaiveTime>,
        office_close: Option<NaiveTime>,
    ) -> PyResult<PyReport> {
        self.report(
            entities,
            Period::Day(date),
            chart_type,
            layout,
            office_open,
            office_close,
        )
    }

    /// Daily peaks Monday-Friday and utilization for the week containing `week_start`.
    #[pyo3(signature = (entities, week_start, chart_type="bar", layout="focus", office_open=None, office_close=None))]
    fn weekly_report(
        &self,
        entities: Vec<String>,
        week_start: NaiveDate,
        chart_type: &str,
        layout: &str,
        office_open: Option<NaiveTime>,
        office_close: Option<NaiveTime>,
    ) -> PyResult<PyReport> {
        self.report(
            entities,
            Period::week(week_start),
            chart_type,
            layout,
            office_open,
            office_close,
        )
    }

    // ── Properties ──────────────────────────────────────────────────────────

    #[getter]
    fn table_df(&self) -> PyResult<Option<PyDataFrame>> {
        Ok(self
            .loaded
            .as_ref()
            .map(|l| PyDataFrame(l.table.frame().clone())))
    }

    #[getter]
    fn load_diagnostics(&self) -> Vec<(String, String)> {
        self.loaded
            .as_ref()
            .map(|l| diagnostics_to_tuples(&l.diagnostics))
            .unwrap_or_default()
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl OccupancyModel {
    fn load(&mut self, sources: &SourceSet) -> PyResult<PyDataFrame> {
        let loaded = self.cache.get_or_load(sources, &self.columns)?;
        let df = loaded.table.frame().clone();
        self.loaded = Some(loaded);
        Ok(PyDataFrame(df))
    }

    fn loaded(&self) -> Result<&Loaded, OccupancyError> {
        self.loaded
            .as_deref()
            .ok_or_else(|| OccupancyError::Config("No data loaded".into()))
    }

    fn report(
        &self,
        entities: Vec<String>,
        period: Period,
        chart_type: &str,
        layout: &str,
        office_open: Option<NaiveTime>,
        office_close: Option<NaiveTime>,
    ) -> PyResult<PyReport> {
        let defaults = OfficeHours::default();
        let office_hours = OfficeHours::new(
            office_open.unwrap_or(defaults.open),
            office_close.unwrap_or(defaults.close),
        )?;
        let selection = Selection::new(entities, period)
            .with_office_hours(office_hours)
            .with_chart_type(ChartType::parse(chart_type)?)
            .with_layout(Layout::parse(layout)?);

        let report = build_report(&self.loaded()?.table, &selection, self.columns.value_kind)?;
        Ok(PyReport { inner: report })
    }
}

#[pyclass(name = "Report")]
pub struct PyReport {
    inner: Report,
}

#[pymethods]
impl PyReport {
    #[getter]
    fn series_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.series_frame()?))
    }

    #[getter]
    fn utilization_df(&self) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.inner.utilization_frame()?))
    }

    #[getter]
    fn labels(&self) -> Vec<String> {
        self.inner.labels.clone()
    }

    #[getter]
    fn diagnostics(&self) -> Vec<(String, String)> {
        diagnostics_to_tuples(&self.inner.diagnostics)
    }

    /// Entities with readings in the window; the others are not charted.
    #[getter]
    fn charted(&self) -> Vec<String> {
        self.inner.charted().map(|e| e.entity.clone()).collect()
    }

    #[getter]
    fn y_axis_upper(&self) -> u64 {
        self.inner.y_axis_upper
    }

    #[getter]
    fn columns(&self) -> usize {
        self.inner.columns
    }

    /// Utilization table as UTF-8 CSV bytes, ready for a download button.
    fn export_csv<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyBytes>> {
        let bytes = to_delimited(&utilization_records(&self.inner))?;
        Ok(PyBytes::new(py, &bytes))
    }
}
