/// Mean Earth radius in meters, used by the haversine distance.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Minimum dwell, in seconds, before leaving a place produces a reminder.
pub const DEFAULT_MIN_SESSION_SECS: u64 = 30;

/// Radius offered to hosts when the user does not pick one.
pub const DEFAULT_RADIUS_METERS: f64 = 60.0;

/// Display name given to places registered with a blank name.
pub const DEFAULT_PLACE_NAME: &str = "Place";

/// Weight of the recency term in the recovery score.
pub const RECENCY_WEIGHT: f64 = 0.6;

/// Weight of the per-place frequency term in the recovery score.
pub const FREQUENCY_WEIGHT: f64 = 0.4;

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60_000;
