//! Time formatting for rendered pages

use chrono::{DateTime, Duration, Utc};

/// Placeholder for missing values
pub const NONE: &str = "-";

/// Render an optional timestamp as `YYYY-MM-DD HH:MM:SS UTC`
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => NONE.to_string(),
    }
}

/// Render a run time compactly, e.g. `2m 05s` or `12.4s`
pub fn format_duration(duration: Option<Duration>) -> String {
    let Some(duration) = duration else {
        return NONE.to_string();
    };
    let millis = duration.num_milliseconds().max(0);
    if millis < 60_000 {
        format!("{:.1}s", millis as f64 / 1000.0)
    } else {
        let secs = millis / 1000;
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
