use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;

use crate::config::{ColumnMap, TimeLayout};
use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::OccupancyError;
use crate::schema::occupancy;
use crate::table::OccupancyTable;
use crate::time::{
    clock_seconds, date_expr, from_excel_serial, hour_minute_seconds, timestamp_expr, trimmed,
    week_start_expr, whole_number, MAX_WHOLE_NUMBER,
};

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

// ── Source sets ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    fn of(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if ext == "csv" {
            Some(SourceFormat::Csv)
        } else if WORKBOOK_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceFormat::Workbook)
        } else {
            None
        }
    }
}

/// Ordered list of source files sharing one column layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSet {
    paths: Vec<PathBuf>,
}

impl SourceSet {
    /// Explicit files, loaded in the given order.
    pub fn files<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Every CSV or workbook file directly inside `dir`, sorted by name.
    pub fn directory(dir: &Path) -> Result<Self, OccupancyError> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && SourceFormat::of(&path).is_some() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Result of a load: the normalized table plus everything that went wrong
/// without being fatal.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub table: OccupancyTable,
    pub sources: Vec<PathBuf>,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct RowIssues {
    pub(crate) unparseable_timestamps: usize,
    pub(crate) invalid_counts: usize,
}

/// Load and concatenate every file of `sources` (file order, then row order).
///
/// Files that cannot be read are skipped with a `SkippedSource` diagnostic.
/// Fails only when no file could be read at all.
pub fn load(sources: &SourceSet, columns: &ColumnMap) -> Result<Loaded, OccupancyError> {
    if sources.is_empty() {
        return Err(OccupancyError::NoSources);
    }

    let mut frame: Option<DataFrame> = None;
    let mut loaded_paths = Vec::new();
    let mut diagnostics = Vec::new();
    let mut issues = RowIssues::default();

    for path in sources.paths() {
        match load_source(path, columns) {
            Ok((df, file_issues)) => {
                log::debug!("Loaded {} rows from {}", df.height(), path.display());
                issues.unparseable_timestamps += file_issues.unparseable_timestamps;
                issues.invalid_counts += file_issues.invalid_counts;
                match frame.as_mut() {
                    Some(acc) => {
                        acc.vstack_mut(&df)?;
                    }
                    None => frame = Some(df),
                }
                loaded_paths.push(path.clone());
            }
            Err(err) => diagnostics.push(Diagnostic::new(
                DiagnosticKind::SkippedSource,
                format!("Skipped {}: {err}", path.display()),
            )),
        }
    }

    let frame = frame.ok_or(OccupancyError::AllSourcesFailed(sources.len()))?;

    if issues.unparseable_timestamps > 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnparseableRows,
            format!(
                "{} rows could not be parsed into a timestamp and are kept with a null timestamp",
                issues.unparseable_timestamps
            ),
        ));
    }
    if issues.invalid_counts > 0 {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::UnparseableRows,
            format!(
                "{} rows have a missing or invalid occupancy value and are kept with a null count",
                issues.invalid_counts
            ),
        ));
    }

    log::info!(
        "Loaded {} rows from {} of {} sources",
        frame.height(),
        loaded_paths.len(),
        sources.len()
    );

    Ok(Loaded {
        table: OccupancyTable::new(frame),
        sources: loaded_paths,
        diagnostics,
    })
}

fn load_source(
    path: &Path,
    columns: &ColumnMap,
) -> Result<(DataFrame, RowIssues), OccupancyError> {
    let raw = match SourceFormat::of(path) {
        Some(SourceFormat::Csv) => read_csv_as_strings(path)?,
        Some(SourceFormat::Workbook) => read_workbook_as_strings(path)?,
        None => return Err(OccupancyError::UnsupportedSource(path.display().to_string())),
    };
    normalize(&raw, columns)
}

// ── Raw readers ─────────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype, header names trimmed.
fn read_csv_as_strings(path: &Path) -> Result<DataFrame, OccupancyError> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;
    Ok(df)
}

/// Read the first worksheet of a workbook; the first row is the header.
fn read_workbook_as_strings(path: &Path) -> Result<DataFrame, OccupancyError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet = workbook.sheet_names().first().cloned().ok_or_else(|| {
        OccupancyError::UnsupportedSource(format!("{}: workbook has no sheets", path.display()))
    })?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut rows = range.rows();
    let header: Vec<String> = match rows.next() {
        Some(row) => row
            .iter()
            .map(|cell| cell_to_string(cell).unwrap_or_default().trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); header.len()];
    for row in rows {
        for (j, column) in values.iter_mut().enumerate() {
            column.push(row.get(j).and_then(cell_to_string));
        }
    }

    let columns: Vec<Column> = header
        .iter()
        .zip(values)
        .map(|(name, column)| Column::new(name.as_str().into(), column))
        .collect();
    Ok(DataFrame::new(columns)?)
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(n) => Some(n.to_string()),
        Data::Float(f) => Some(format!("{}", f)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            let value = from_excel_serial(serial)?;
            let text = if serial < 1.0 {
                value.format("%H:%M:%S").to_string()
            } else if serial.fract() == 0.0 {
                value.format("%Y-%m-%d").to_string()
            } else {
                value.format("%Y-%m-%d %H:%M:%S").to_string()
            };
            Some(text)
        }
        Data::DateTimeIso(s) => Some(s.replacen('T', " ", 1)),
        Data::DurationIso(s) => Some(s.clone()),
    }
}

// ── Normalization ───────────────────────────────────────────────────────────

fn source(name: &str) -> Expr {
    col(name).cast(DataType::String)
}

/// Build the normalized columns from a raw all-string table.
///
/// Cells that do not parse become null; the row is kept and counted in
/// the returned `RowIssues`.
pub(crate) fn normalize(
    raw: &DataFrame,
    columns: &ColumnMap,
) -> Result<(DataFrame, RowIssues), OccupancyError> {
    for name in columns.required() {
        raw.column(name)
            .map_err(|_| OccupancyError::MissingColumn(name.to_string()))?;
    }

    let floor = match &columns.floor {
        Some(name) => trimmed(source(name)),
        None => lit(NULL).cast(DataType::String),
    };
    let capacity = match &columns.capacity {
        Some(name) => whole_number(source(name), MAX_WHOLE_NUMBER),
        None => lit(NULL).cast(DataType::Int64),
    };
    let seconds = match &columns.time {
        TimeLayout::HourMinute { hour, minute } => {
            hour_minute_seconds(source(hour), source(minute))
        }
        TimeLayout::Clock { column } => clock_seconds(source(column)),
    };

    let df = raw
        .clone()
        .lazy()
        .select([
            trimmed(source(&columns.entity)).alias(occupancy::ENTITY_ID),
            floor.alias(occupancy::FLOOR_ID),
            date_expr(source(&columns.date)).alias(occupancy::LOCAL_DATE),
            seconds.alias(occupancy::SECOND_OF_DAY),
            whole_number(source(&columns.value), MAX_WHOLE_NUMBER).alias(occupancy::COUNT),
            capacity.alias(occupancy::CAPACITY),
        ])
        .with_columns([
            week_start_expr(col(occupancy::LOCAL_DATE)).alias(occupancy::WEEK_START),
            timestamp_expr(col(occupancy::LOCAL_DATE), col(occupancy::SECOND_OF_DAY))
                .alias(occupancy::TIMESTAMP),
        ])
        // A time of day without a date is no reading.
        .with_column(
            when(col(occupancy::TIMESTAMP).is_not_null())
                .then(col(occupancy::SECOND_OF_DAY))
                .otherwise(lit(NULL).cast(DataType::Int32))
                .alias(occupancy::SECOND_OF_DAY),
        )
        .select(occupancy::ALL.map(col))
        .collect()?;

    let issues = RowIssues {
        unparseable_timestamps: df.column(occupancy::TIMESTAMP)?.null_count(),
        invalid_counts: df.column(occupancy::COUNT)?.null_count(),
    };
    Ok((df, issues))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn raw_frame(rows: &[[&str; 6]]) -> DataFrame {
        let names = [
            "Location Name",
            "Local Date",
            "Local Hour",
            "Local Minute",
            "Associated Users Count",
            "Capacity",
        ];
        let columns: Vec<Column> = names
            .iter()
            .enumerate()
            .map(|(j, name)| {
                let values: Vec<Option<String>> = rows
                    .iter()
                    .map(|r| Some(r[j].to_string()).filter(|s| !s.is_empty()))
                    .collect();
                Column::new((*name).into(), values)
            })
            .collect();
        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn normalize_builds_timestamp_and_week_start() {
        let raw = raw_frame(&[["Floor 3", "2024-05-08", "9", "30", "12", "40"]]);
        let (df, issues) = normalize(&raw, &ColumnMap::floor_export()).unwrap();
        let table = OccupancyTable::new(df);

        assert_eq!(issues.unparseable_timestamps, 0);
        assert_eq!(
            table.available_dates().unwrap(),
            vec![NaiveDate::from_ymd_opt(2024, 5, 8).unwrap()]
        );
        assert_eq!(
            table.available_week_starts().unwrap(),
            vec![NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()]
        );
        let seconds = table
            .frame()
            .column(occupancy::SECOND_OF_DAY)
            .unwrap()
            .as_materialized_series()
            .i32()
            .unwrap()
            .get(0);
        assert_eq!(seconds, Some(9 * 3600 + 30 * 60));
    }

    #[test]
    fn unparseable_rows_are_kept_with_null_timestamp() {
        let raw = raw_frame(&[
            ["Floor 3", "2024-05-08", "9", "0", "4", "40"],
            ["Floor 3", "not a date", "10", "0", "5", "40"],
            ["Floor 3", "2024-05-08", "25", "0", "6", "40"],
        ]);
        let (df, issues) = normalize(&raw, &ColumnMap::floor_export()).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(issues.unparseable_timestamps, 2);
        assert_eq!(df.column(occupancy::TIMESTAMP).unwrap().null_count(), 2);
        // the bad hour still has a usable date
        assert_eq!(df.column(occupancy::LOCAL_DATE).unwrap().null_count(), 1);
    }

    #[test]
    fn negative_and_blank_counts_become_null() {
        let raw = raw_frame(&[
            ["Floor 3", "2024-05-08", "9", "0", "-1", "40"],
            ["Floor 3", "2024-05-08", "9", "15", "", "40"],
            ["Floor 3", "2024-05-08", "9", "30", "3.0", ""],
        ]);
        let (df, issues) = normalize(&raw, &ColumnMap::floor_export()).unwrap();

        assert_eq!(issues.invalid_counts, 2);
        let counts = df
            .column(occupancy::COUNT)
            .unwrap()
            .as_materialized_series()
            .i64()
            .unwrap()
            .clone();
        assert_eq!(counts.get(0), None);
        assert_eq!(counts.get(1), None);
        assert_eq!(counts.get(2), Some(3));
        assert_eq!(df.column(occupancy::CAPACITY).unwrap().null_count(), 1);
    }

    #[test]
    fn missing_mapped_column_is_reported() {
        let raw = raw_frame(&[["Floor 3", "2024-05-08", "9", "0", "1", "40"]]);
        let err = normalize(&raw, &ColumnMap::room_export()).unwrap_err();
        assert!(matches!(err, OccupancyError::MissingColumn(_)));
    }

    #[test]
    fn source_format_by_extension() {
        assert_eq!(SourceFormat::of(Path::new("a.CSV")), Some(SourceFormat::Csv));
        assert_eq!(
            SourceFormat::of(Path::new("Room Occupancy/week1.xlsx")),
            Some(SourceFormat::Workbook)
        );
        assert_eq!(SourceFormat::of(Path::new("notes.txt")), None);
    }

    #[test]
    fn empty_source_set_is_fatal() {
        let err = load(&SourceSet::files(Vec::<PathBuf>::new()), &ColumnMap::floor_export())
            .unwrap_err();
        assert!(matches!(err, OccupancyError::NoSources));
    }
}
