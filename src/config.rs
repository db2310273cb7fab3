use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer};

use crate::aggregate::Reducer;
use crate::error::OccupancyError;
use crate::time::parse_clock;

// ── Office hours ────────────────────────────────────────────────────────────

/// Inclusive time-of-day window that aggregation is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct OfficeHours {
    #[serde(deserialize_with = "deserialize_clock")]
    pub open: NaiveTime,
    #[serde(deserialize_with = "deserialize_clock")]
    pub close: NaiveTime,
}

impl OfficeHours {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Result<Self, OccupancyError> {
        let hours = Self { open, close };
        hours.validate()?;
        Ok(hours)
    }

    pub fn validate(&self) -> Result<(), OccupancyError> {
        if self.open > self.close {
            return Err(OccupancyError::Config(format!(
                "office hours open at {} but close at {}",
                self.open, self.close
            )));
        }
        Ok(())
    }

    pub fn open_second(&self) -> i32 {
        self.open.num_seconds_from_midnight() as i32
    }

    pub fn close_second(&self) -> i32 {
        self.close.num_seconds_from_midnight() as i32
    }

    /// Bucket start times, one per hour from open while not past close.
    pub fn hour_starts(&self) -> Vec<NaiveTime> {
        let mut starts = Vec::new();
        let mut second = self.open_second();
        while second <= self.close_second() {
            if let Some(t) = NaiveTime::from_num_seconds_from_midnight_opt(second as u32, 0) {
                starts.push(t);
            }
            second += 3600;
        }
        starts
    }
}

impl Default for OfficeHours {
    fn default() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
        }
    }
}

fn deserialize_clock<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_clock(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid time of day '{raw}'")))
}

// ── Period ──────────────────────────────────────────────────────────────────

/// A single day or a Monday-Friday working week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Day(NaiveDate),
    Week(NaiveDate),
}

impl Period {
    /// The working week containing `date`.
    pub fn week(date: NaiveDate) -> Self {
        Period::Week(week_start(date))
    }

    pub fn first_day(&self) -> NaiveDate {
        match self {
            Period::Day(date) => *date,
            Period::Week(date) => week_start(*date),
        }
    }

    pub fn last_day(&self) -> NaiveDate {
        match self {
            Period::Day(date) => *date,
            Period::Week(date) => week_start(*date) + Duration::days(4),
        }
    }

    pub fn is_weekly(&self) -> bool {
        matches!(self, Period::Week(_))
    }
}

/// Monday of the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

// ── Presentation choices ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
    Area,
    Scatter,
    Heatmap,
}

impl ChartType {
    pub fn parse(raw: &str) -> Result<Self, OccupancyError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bar" => Ok(ChartType::Bar),
            "line" => Ok(ChartType::Line),
            "area" => Ok(ChartType::Area),
            "scatter" => Ok(ChartType::Scatter),
            "heatmap" => Ok(ChartType::Heatmap),
            other => Err(OccupancyError::Config(format!(
                "Invalid chart type: '{other}'. Must be one of bar, line, area, scatter, heatmap"
            ))),
        }
    }
}

/// Controls how many chart columns the dashboard lays out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    #[default]
    Focus,
    Analyse,
}

impl Layout {
    pub fn parse(raw: &str) -> Result<Self, OccupancyError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "focus" => Ok(Layout::Focus),
            "analyse" | "analyze" => Ok(Layout::Analyse),
            other => Err(OccupancyError::Config(format!(
                "Invalid layout: '{other}'. Must be 'focus' or 'analyse'"
            ))),
        }
    }

    pub fn columns(&self, entities: usize) -> usize {
        match self {
            Layout::Focus => 1,
            Layout::Analyse if entities > 1 => entities.min(4),
            Layout::Analyse => 1,
        }
    }
}

// ── Selection ───────────────────────────────────────────────────────────────

/// Everything a dashboard interaction selects, passed into the report pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Selection {
    pub entity_ids: Vec<String>,
    pub period: Period,
    #[serde(default)]
    pub office_hours: OfficeHours,
    #[serde(default)]
    pub chart_type: ChartType,
    #[serde(default)]
    pub layout: Layout,
    /// How readings inside one bucket combine; peak by default.
    #[serde(default)]
    pub reducer: Reducer,
}

impl Selection {
    pub fn new(entity_ids: Vec<String>, period: Period) -> Self {
        Self {
            entity_ids,
            period,
            office_hours: OfficeHours::default(),
            chart_type: ChartType::default(),
            layout: Layout::default(),
            reducer: Reducer::default(),
        }
    }

    pub fn with_office_hours(mut self, office_hours: OfficeHours) -> Self {
        self.office_hours = office_hours;
        self
    }

    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = chart_type;
        self
    }

    pub fn with_reducer(mut self, reducer: Reducer) -> Self {
        self.reducer = reducer;
        self
    }
}

// ── Source column mapping ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum TimeLayout {
    /// Separate integer hour and minute columns.
    HourMinute { hour: String, minute: String },
    /// A single `HH:MM[:SS]` column.
    Clock { column: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Headcount per observation.
    #[default]
    Count,
    /// 0/1 flag, someone was present or not.
    Presence,
}

/// Names of the source columns feeding each normalized column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ColumnMap {
    pub entity: String,
    #[serde(default)]
    pub floor: Option<String>,
    pub date: String,
    pub time: TimeLayout,
    pub value: String,
    #[serde(default)]
    pub value_kind: ValueKind,
    #[serde(default)]
    pub capacity: Option<String>,
}

impl ColumnMap {
    /// Floor-level export: one row per floor sample.
    pub fn floor_export() -> Self {
        Self {
            entity: "Location Name".to_string(),
            floor: None,
            date: "Local Date".to_string(),
            time: TimeLayout::HourMinute {
                hour: "Local Hour".to_string(),
                minute: "Local Minute".to_string(),
            },
            value: "Associated Users Count".to_string(),
            value_kind: ValueKind::Count,
            capacity: Some("Capacity".to_string()),
        }
    }

    /// Room-level export with a floor column for grouping.
    pub fn room_export() -> Self {
        Self {
            entity: "Room Name".to_string(),
            floor: Some("Floor".to_string()),
            date: "Date".to_string(),
            time: TimeLayout::HourMinute {
                hour: "Hour".to_string(),
                minute: "Minute".to_string(),
            },
            value: "Occupancy Count".to_string(),
            value_kind: ValueKind::Count,
            capacity: Some("Capacity".to_string()),
        }
    }

    pub fn preset(name: &str) -> Result<Self, OccupancyError> {
        match name {
            "floor" => Ok(Self::floor_export()),
            "room" => Ok(Self::room_export()),
            other => Err(OccupancyError::Config(format!(
                "Unknown column preset: '{other}'. Must be 'floor' or 'room'"
            ))),
        }
    }

    pub fn with_value_kind(mut self, value_kind: ValueKind) -> Self {
        self.value_kind = value_kind;
        self
    }

    /// Every source column this mapping reads.
    pub fn required(&self) -> Vec<&str> {
        let mut names = vec![self.entity.as_str(), self.date.as_str()];
        match &self.time {
            TimeLayout::HourMinute { hour, minute } => {
                names.push(hour);
                names.push(minute);
            }
            TimeLayout::Clock { column } => names.push(column),
        }
        names.push(&self.value);
        if let Some(floor) = &self.floor {
            names.push(floor);
        }
        if let Some(capacity) = &self.capacity {
            names.push(capacity);
        }
        names
    }
}

// ── Run file ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ColumnsConfig {
    Preset { preset: String },
    Explicit(ColumnMap),
}

impl ColumnsConfig {
    pub fn resolve(&self) -> Result<ColumnMap, OccupancyError> {
        match self {
            ColumnsConfig::Preset { preset } => ColumnMap::preset(preset),
            ColumnsConfig::Explicit(map) => Ok(map.clone()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default)]
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    pub export_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// Batch run description read by `occupancy-report`.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub sources: SourcesConfig,
    pub columns: ColumnsConfig,
    pub selection: Selection,
    pub output: OutputSettings,
    #[serde(default)]
    pub log_settings: LogSettings,
}

impl RunConfig {
    /// Rebase relative paths onto `base`, normally the run file's directory.
    pub fn rebase(mut self, base: &Path) -> Self {
        if let Some(dir) = self.sources.directory.take() {
            self.sources.directory = Some(base.join(dir));
        }
        self.sources.files = self.sources.files.iter().map(|f| base.join(f)).collect();
        self.output.export_path = base.join(&self.output.export_path);
        if let Some(file) = self.log_settings.log_file.take() {
            self.log_settings.log_file = Some(base.join(file));
        }
        self
    }
}

pub fn read_config(file_path: &Path) -> Result<RunConfig, OccupancyError> {
    let input_toml = std::fs::read_to_string(file_path)?;
    let config: RunConfig = toml::from_str(&input_toml)?;
    config.selection.office_hours.validate()?;
    let base = file_path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.rebase(base))
}
