use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};

/// UTC wall-clock timestamp used for file metadata.
pub type Timestamp = DateTime<Utc>;

/// Convert a filesystem `SystemTime` into a [`Timestamp`].
pub fn system_time_to_timestamp(time: SystemTime) -> Timestamp {
    DateTime::<Utc>::from(time)
}

/// Seconds since the UNIX epoch, saturating at zero for clocks set before it.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
