//! Relative time formatting
//!
//! Both helpers take every input explicitly (including "now") so one render
//! pass formats all rows against a single clock reading.

use chrono::{DateTime, Utc};

const MINUTES_PER_HOUR: i64 = 60;
const MINUTES_PER_DAY: i64 = 24 * MINUTES_PER_HOUR;

/// Freshness label such as `just now`, `12m ago`, `3h ago` or `2d ago`
///
/// Timestamps in the future (clock skew) read as `just now`.
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < MINUTES_PER_HOUR {
        format!("{}m ago", minutes)
    } else if minutes < MINUTES_PER_DAY {
        format!("{}h ago", minutes / MINUTES_PER_HOUR)
    } else {
        format!("{}d ago", minutes / MINUTES_PER_DAY)
    }
}

/// Countdown label for the next poll, e.g. `58s` or `2m 05s`
pub fn countdown(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else {
        format!("{}m {:02}s", seconds / 60, seconds % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_time_ago_buckets() {
        let now = Utc::now();
        assert_eq!(time_ago(now, now), "just now");
        assert_eq!(time_ago(now - Duration::seconds(59), now), "just now");
        assert_eq!(time_ago(now - Duration::minutes(12), now), "12m ago");
        assert_eq!(time_ago(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(time_ago(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(time_ago(now - Duration::hours(8), now), "8h ago");
        assert_eq!(time_ago(now - Duration::hours(24), now), "1d ago");
        assert_eq!(time_ago(now - Duration::days(9), now), "9d ago");
    }

    #[test]
    fn test_time_ago_future_is_just_now() {
        let now = Utc::now();
        assert_eq!(time_ago(now + Duration::minutes(5), now), "just now");
    }

    #[test]
    fn test_countdown() {
        assert_eq!(countdown(0), "0s");
        assert_eq!(countdown(58), "58s");
        assert_eq!(countdown(60), "1m 00s");
        assert_eq!(countdown(125), "2m 05s");
    }
}
