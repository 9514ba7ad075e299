//! Next-reset-time computation
//!
//! Three cadences exist: daily dungeons reset at a fixed hour, weekly raids
//! at a fixed weekday + hour, and legacy raid/heroic maps on a whole-day
//! period derived from their raw duration and the global rate multiplier.

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ResetConfig;

const DAY_SECS: i64 = 86_400;

/// Reset cadence of one (map, difficulty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ResetCadence {
    Daily,
    Weekly,
    /// Raw duration in seconds, scaled by the configured rate multiplier
    /// and floored to whole days (minimum one).
    Periodic { raw_duration_secs: i64 },
}

/// Midnight-of-day helper, keeping the calendar date of `t`.
fn at_hour(t: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    t.with_hour(hour)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Next daily reset: today at `daily_hour` if that is still ahead, else
/// tomorrow at `daily_hour`.
pub fn next_daily_reset(now: DateTime<Utc>, daily_hour: u32) -> DateTime<Utc> {
    let today = at_hour(now, daily_hour);
    if now < today { today } else { today + Duration::days(1) }
}

/// Next weekly reset: the configured weekday (0 = Sunday) at `daily_hour`,
/// advanced by seven days if that instant already passed this week.
pub fn next_weekly_reset(now: DateTime<Utc>, weekly_day: u32, daily_hour: u32) -> DateTime<Utc> {
    use chrono::Datelike;

    let days_from_sunday = now.weekday().num_days_from_sunday() as i64;
    let this_week = at_hour(now - Duration::days(days_from_sunday), daily_hour)
        + Duration::days(weekly_day as i64 % 7);
    if now < this_week { this_week } else { this_week + Duration::days(7) }
}

/// Length of one reset period for a cadence.
pub fn reset_period(cadence: ResetCadence, config: &ResetConfig) -> Duration {
    match cadence {
        ResetCadence::Daily => Duration::days(1),
        ResetCadence::Weekly => Duration::days(7),
        ResetCadence::Periodic { raw_duration_secs } => {
            let scaled = (raw_duration_secs as f64 * config.rate_multiplier as f64) as i64;
            let days = (scaled / DAY_SECS).max(1);
            Duration::days(days)
        }
    }
}

/// Next periodic reset: the prior stored reset time, pinned to the
/// configured instance hour, advanced by whole periods until it exceeds
/// `now`.
pub fn next_periodic_reset(
    prev: DateTime<Utc>,
    raw_duration_secs: i64,
    config: &ResetConfig,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let period = reset_period(ResetCadence::Periodic { raw_duration_secs }, config);
    let mut next = at_hour(prev, config.instance_hour_offset as u32);
    while next <= now {
        next += period;
    }
    next
}

/// Next reset for a cadence, given the prior stored reset time (periodic
/// cadences only).
pub fn next_reset(
    cadence: ResetCadence,
    prev: Option<DateTime<Utc>>,
    config: &ResetConfig,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    match cadence {
        ResetCadence::Daily => next_daily_reset(now, config.daily_hour as u32),
        ResetCadence::Weekly => {
            next_weekly_reset(now, config.weekly_day as u32, config.daily_hour as u32)
        }
        ResetCadence::Periodic { raw_duration_secs } => {
            // With no stored prior reset, anchor the cycle at today's
            // instance hour.
            let prev = prev.unwrap_or_else(|| at_hour(now, config.instance_hour_offset as u32));
            next_periodic_reset(prev, raw_duration_secs, config, now)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn cfg() -> ResetConfig {
        ResetConfig::default()
    }

    // 2023-11-15 is a Wednesday.
    fn wednesday(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 15, hour, 0, 0).unwrap()
    }

    #[test]
    fn test_daily_before_hour() {
        let now = wednesday(7);
        assert_eq!(next_daily_reset(now, 9), wednesday(9));
    }

    #[test]
    fn test_daily_after_hour() {
        let now = wednesday(10);
        assert_eq!(next_daily_reset(now, 9), wednesday(9) + Duration::days(1));
    }

    #[test]
    fn test_weekly_already_passed_this_week() {
        // day=2 (Tuesday), hour=9; now is Tuesday 10:00.
        let now = Utc.with_ymd_and_hms(2023, 11, 14, 10, 0, 0).unwrap();
        let next = next_weekly_reset(now, 2, 9);
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 11, 21, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_weekly_still_ahead_this_week() {
        // Wednesday now, target Saturday (day=6).
        let now = wednesday(10);
        let next = next_weekly_reset(now, 6, 9);
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 11, 18, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_periodic_floors_to_whole_days() {
        let config = cfg();
        // 2.5 days of raw duration floors to a 2-day period.
        let period = reset_period(ResetCadence::Periodic { raw_duration_secs: 216_000 }, &config);
        assert_eq!(period, Duration::days(2));
    }

    #[test]
    fn test_periodic_minimum_one_day() {
        let mut config = cfg();
        config.rate_multiplier = 0.1;
        let period = reset_period(ResetCadence::Periodic { raw_duration_secs: DAY_SECS }, &config);
        assert_eq!(period, Duration::days(1));
    }

    #[test]
    fn test_periodic_advances_whole_periods() {
        let config = cfg();
        let prev = Utc.with_ymd_and_hms(2023, 11, 1, 0, 0, 0).unwrap();
        let now = wednesday(10);
        // 7-day period from Nov 1 -> Nov 8 -> Nov 15; Nov 15 00:00 <= now,
        // so the next reset is Nov 22.
        let next = next_periodic_reset(prev, 7 * DAY_SECS, &config, now);
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 11, 22, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_periodic_pins_instance_hour() {
        let mut config = cfg();
        config.instance_hour_offset = 4;
        let prev = Utc.with_ymd_and_hms(2023, 11, 1, 9, 30, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2023, 11, 2, 0, 0, 0).unwrap();
        let next = next_periodic_reset(prev, 7 * DAY_SECS, &config, now);
        assert_eq!(next, Utc.with_ymd_and_hms(2023, 11, 8, 4, 0, 0).unwrap());
    }
}
