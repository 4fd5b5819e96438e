//! Small humanizing helpers for the metadata line.

use std::time::Duration;
use time::OffsetDateTime;

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

/// `"1 row"`, `"0 rows"`, `"12 rows"`
pub fn row_count_label(count: usize) -> String {
    format!("{count} {}", pluralize("row", count))
}

pub const RUNNING_INDICATOR: &str = "Running…";

/// Humanized runtime, or the running indicator while the query executes.
pub fn runtime_label(runtime_seconds: Option<f64>, executing: bool) -> String {
    if executing {
        return RUNNING_INDICATOR.to_string();
    }
    let secs = match runtime_seconds {
        Some(s) if s.is_finite() && s > 0.0 => s,
        _ => return "-".to_string(),
    };
    let d = if secs < 1.0 {
        Duration::from_millis(((secs * 1000.0).round() as u64).max(1))
    } else {
        Duration::from_secs(secs.round() as u64)
    };
    humantime::format_duration(d).to_string()
}

/// Relative "time ago" text with a `"-"` placeholder.
pub fn time_ago(at: Option<OffsetDateTime>, now: OffsetDateTime) -> String {
    let Some(at) = at else {
        return "-".to_string();
    };
    let secs = (now - at).whole_seconds();
    if secs < 45 {
        return "a few seconds ago".to_string();
    }
    let secs = secs as f64;
    let minutes = secs / 60.0;
    let hours = minutes / 60.0;
    let days = hours / 24.0;
    if secs < 90.0 {
        "a minute ago".to_string()
    } else if minutes < 45.0 {
        format!("{} minutes ago", minutes.round())
    } else if minutes < 90.0 {
        "an hour ago".to_string()
    } else if hours < 22.0 {
        format!("{} hours ago", hours.round())
    } else if hours < 36.0 {
        "a day ago".to_string()
    } else if days < 26.0 {
        format!("{} days ago", days.round())
    } else if days < 45.0 {
        "a month ago".to_string()
    } else if days < 320.0 {
        format!("{} months ago", (days / 30.4).round())
    } else if days < 548.0 {
        "a year ago".to_string()
    } else {
        format!("{} years ago", (days / 365.0).round())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn pluralization() {
        assert_eq!(row_count_label(0), "0 rows");
        assert_eq!(row_count_label(1), "1 row");
        assert_eq!(row_count_label(2), "2 rows");
        assert_eq!(row_count_label(1000), "1000 rows");
    }

    #[test]
    fn runtime_is_hidden_while_executing() {
        assert_eq!(runtime_label(Some(12.0), true), RUNNING_INDICATOR);
        assert_eq!(runtime_label(None, false), "-");
        assert_eq!(runtime_label(Some(0.0), false), "-");
        assert_eq!(runtime_label(Some(0.25), false), "250ms");
        assert_eq!(runtime_label(Some(65.4), false), "1m 5s");
        assert_eq!(runtime_label(Some(3600.0), false), "1h");
    }

    #[test]
    fn relative_times() {
        let now = datetime!(2026-10-19 12:00:00 UTC);
        assert_eq!(time_ago(None, now), "-");
        assert_eq!(time_ago(Some(datetime!(2026-10-19 11:59:30 UTC)), now), "a few seconds ago");
        assert_eq!(time_ago(Some(datetime!(2026-10-19 11:59:00 UTC)), now), "a minute ago");
        assert_eq!(time_ago(Some(datetime!(2026-10-19 11:55:00 UTC)), now), "5 minutes ago");
        assert_eq!(time_ago(Some(datetime!(2026-10-19 10:00:00 UTC)), now), "2 hours ago");
        assert_eq!(time_ago(Some(datetime!(2026-10-16 12:00:00 UTC)), now), "3 days ago");
        // clock skew: retrieved "in the future"
        assert_eq!(time_ago(Some(datetime!(2026-10-19 12:05:00 UTC)), now), "a few seconds ago");
    }
}
