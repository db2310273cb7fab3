/// Column-name constants for the normalized occupancy table.
/// Single source of truth - exported to Python via PyO3.

// ── Occupancy table columns ─────────────────────────────────────────────────
pub mod occupancy {
    pub const ENTITY_ID: &str = "entity_id";
    pub const FLOOR_ID: &str = "floor_id";
    pub const LOCAL_DATE: &str = "local_date";
    pub const WEEK_START: &str = "week_start";
    pub const TIMESTAMP: &str = "timestamp";
    pub const SECOND_OF_DAY: &str = "second_of_day";
    pub const COUNT: &str = "count";
    pub const CAPACITY: &str = "capacity";

    pub const ALL: [&str; 8] = [
        ENTITY_ID,
        FLOOR_ID,
        LOCAL_DATE,
        WEEK_START,
        TIMESTAMP,
        SECOND_OF_DAY,
        COUNT,
        CAPACITY,
    ];
}

// ── Aggregated series columns ───────────────────────────────────────────────
pub mod series {
    pub const ENTITY_ID: &str = "entity_id";
    pub const BUCKET: &str = "bucket";
    pub const BUCKET_START: &str = "bucket_start";
    pub const VALUE: &str = "value";
}

// ── Utilization columns ─────────────────────────────────────────────────────
pub mod utilization {
    pub const ENTITY_ID: &str = "entity_id";
    pub const CAPACITY: &str = "capacity";
    pub const PEAK: &str = "peak";
    pub const PERCENT: &str = "utilization_pct";
    pub const HAS_DATA: &str = "has_data";
}

// ── Export headers ──────────────────────────────────────────────────────────
pub mod export {
    pub const ENTITY: &str = "Floor/Room";
    pub const AVERAGE_UTILIZATION: &str = "Average Utilization (%)";
    pub const USAGE: &str = "Usage (%)";
}

// Internal columns used while grouping.
pub(crate) const BUCKET_KEY: &str = "_bucket_key";
