//! Time utilities and constants.

use chrono::{DateTime, Duration, Utc};

/// Rate freshness constants.
pub mod constants {
    use super::Duration;

    /// Age after which a cached rate table is refreshed on next access (5 minutes).
    pub fn freshness_threshold() -> Duration {
        Duration::minutes(5)
    }

    /// Age after which a served rate table is flagged stale even without a
    /// failed refresh (24 hours). The record is still served.
    pub fn soft_expiry() -> Duration {
        Duration::hours(24)
    }
}

/// Milliseconds since the Unix epoch.
pub type Millis = i64;

/// Get the current time in milliseconds since the Unix epoch.
pub fn now_millis() -> Millis {
    Utc::now().timestamp_millis()
}

/// Convert a provider timestamp in seconds to milliseconds.
pub fn secs_to_millis(secs: i64) -> Millis {
    secs.saturating_mul(1000)
}

/// Age of a timestamp relative to `now`. Timestamps in the future have zero age.
pub fn age(timestamp: Millis, now: Millis) -> Duration {
    let diff = now.saturating_sub(timestamp);
    if diff <= 0 {
        Duration::zero()
    } else {
        Duration::milliseconds(diff)
    }
}

/// Convert milliseconds to a UTC datetime, if in range.
pub fn to_datetime(timestamp: Millis) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
}
