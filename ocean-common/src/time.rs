//! Timestamp utilities

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

/// Scale a step duration expressed in (possibly fractional) seconds by the
/// configured length of one second.
///
/// Negative and non-finite inputs collapse to zero; results too large for a
/// `Duration` saturate at `Duration::MAX`.
pub fn scaled_seconds(seconds: f64, unit: Duration) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds * unit.as_secs_f64()).unwrap_or(Duration::MAX)
}
