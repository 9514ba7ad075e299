//! Centralized time/duration formatting utilities.
//!
//! All human-facing time display goes through this module so the CLI and log
//! output agree on one notation.

/// Format a duration in whole seconds as a compact `1d 2h 3m 4s` string.
///
/// Zero-valued leading units are skipped; `0` seconds formats as `"0s"`.
///
/// # Examples
/// ```
/// use wardstone_types::formatting::format_duration_secs;
/// assert_eq!(format_duration_secs(0), "0s");
/// assert_eq!(format_duration_secs(75), "1m 15s");
/// assert_eq!(format_duration_secs(90_061), "1d 1h 1m 1s");
/// ```
pub fn format_duration_secs(total_secs: i64) -> String {
    if total_secs <= 0 {
        return "0s".to_string();
    }

    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let mins = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;

    let mut parts = Vec::with_capacity(4);
    if days > 0 {
        parts.push(format!("{days}d"));
    }
    if hours > 0 {
        parts.push(format!("{hours}h"));
    }
    if mins > 0 {
        parts.push(format!("{mins}m"));
    }
    if secs > 0 || parts.is_empty() {
        parts.push(format!("{secs}s"));
    }
    parts.join(" ")
}

/// Format a duration as a short `H:MM:SS` clock string (for countdowns).
///
/// # Examples
/// ```
/// use wardstone_types::formatting::format_clock;
/// assert_eq!(format_clock(59), "0:59");
/// assert_eq!(format_clock(3_725), "1:02:05");
/// ```
pub fn format_clock(total_secs: i64) -> String {
    let total_secs = total_secs.max(0);
    let hours = total_secs / 3_600;
    let mins = (total_secs % 3_600) / 60;
    let secs = total_secs % 60;

    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}
