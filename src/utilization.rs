use crate::aggregate::AggregatedSeries;
use crate::config::ValueKind;

/// Utilization percentage of one entity.
///
/// `flagged` is set when the value could not be computed and was reported
/// as 0 instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Utilization {
    pub percent: f64,
    pub flagged: bool,
}

impl Utilization {
    fn computed(percent: f64) -> Self {
        Self {
            percent,
            flagged: false,
        }
    }

    fn zero_flagged() -> Self {
        Self {
            percent: 0.0,
            flagged: true,
        }
    }
}

/// `100 * mean(series) / capacity`. Missing or zero capacity gives 0, flagged.
pub fn count_utilization(series: &AggregatedSeries, capacity: Option<u64>) -> Utilization {
    match capacity {
        Some(capacity) if capacity > 0 => {
            Utilization::computed(100.0 * series.mean() / capacity as f64)
        }
        _ => Utilization::zero_flagged(),
    }
}

/// `100 * sum(series) / len(series)`, the share of buckets with presence.
pub fn presence_utilization(series: &AggregatedSeries) -> Utilization {
    Utilization::computed(100.0 * series.mean())
}

pub fn utilization(
    series: &AggregatedSeries,
    capacity: Option<u64>,
    value_kind: ValueKind,
) -> Utilization {
    match value_kind {
        ValueKind::Count => count_utilization(series, capacity),
        ValueKind::Presence => presence_utilization(series),
    }
}
