use crate::config::ValueKind;
use crate::error::OccupancyError;
use crate::report::Report;
use crate::schema::export;

/// Ordered named fields of one exported row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord {
    fields: Vec<(String, String)>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }
}

/// Header row taken from the first record, then one row per record.
///
/// Records are not checked against each other: a record with a different
/// number of fields produces a ragged row.
pub fn to_delimited(records: &[FlatRecord]) -> Result<Vec<u8>, OccupancyError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());

    if let Some(first) = records.first() {
        writer.write_record(first.names())?;
    }
    for record in records {
        writer.write_record(record.values())?;
    }

    writer
        .into_inner()
        .map_err(|err| OccupancyError::Io(err.into_error()))
}

pub fn format_percent(percent: f64) -> String {
    if percent.fract() == 0.0 {
        format!("{percent:.1}")
    } else {
        percent.to_string()
    }
}

/// `Floor/Room` plus the utilization column matching the report's value kind.
pub fn utilization_records(report: &Report) -> Vec<FlatRecord> {
    let header = match report.value_kind {
        ValueKind::Count => export::AVERAGE_UTILIZATION,
        ValueKind::Presence => export::USAGE,
    };
    report
        .entities
        .iter()
        .map(|e| {
            FlatRecord::new()
                .field(export::ENTITY, e.entity.as_str())
                .field(header, format_percent(e.utilization.percent))
        })
        .collect()
}
