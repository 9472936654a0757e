//! Time helpers shared across packages.

use chrono::{Local, TimeZone, Utc};

/// Current Unix timestamp in seconds, with sub-second precision.
///
/// This is the timestamp representation used on the chat wire protocol.
pub fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Render a float Unix timestamp as local wall-clock time (`HH:MM:SS`).
///
/// Timestamps that fall outside the representable range render as
/// `--:--:--` instead of failing.
pub fn format_timestamp(timestamp: f64) -> String {
    let millis = (timestamp * 1000.0) as i64;
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|datetime| datetime.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}
