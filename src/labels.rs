//! Human-facing labels for scale-out parameters.

use crate::model::{DurationHours, ScaleLevel};

/// Labels for the durations offered by default, keyed by minutes.
const DURATION_LABELS: &[(u32, &str)] = &[
    (10, "10 minutes"),
    (30, "30 minutes"),
    (60, "1 hour"),
    (120, "2 hours"),
    (240, "4 hours"),
    (480, "8 hours"),
    (1440, "24 hours"),
];

/// Label for an expiry duration; values outside the table render as `"<hours> hours"`.
pub fn duration_label(d: DurationHours) -> String {
    DURATION_LABELS
        .iter()
        .find(|(minutes, _)| *minutes == d.minutes())
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| format!("{} hours", d.hours()))
}

pub fn level_label(level: ScaleLevel) -> &'static str {
    match level {
        ScaleLevel::Light => "Light",
        ScaleLevel::Standard => "Standard",
        ScaleLevel::Maximum => "Maximum",
    }
}

pub fn size_label(size: u32) -> String {
    if size == 1 {
        "1 worker".to_string()
    } else {
        format!("{size} workers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_durations_have_fixed_labels() {
        let cases = [
            (10, "10 minutes"),
            (30, "30 minutes"),
            (60, "1 hour"),
            (120, "2 hours"),
            (240, "4 hours"),
            (480, "8 hours"),
            (1440, "24 hours"),
        ];
        for (minutes, expected) in cases {
            assert_eq!(duration_label(DurationHours::from_minutes(minutes)), expected);
        }
    }

    #[test]
    fn unknown_durations_fall_back_to_hours() {
        assert_eq!(duration_label(DurationHours::from_minutes(180)), "3 hours");
        assert_eq!(duration_label(DurationHours::from_minutes(90)), "1.5 hours");
        assert_eq!(duration_label(DurationHours::from_minutes(15)), "0.25 hours");
        assert_eq!(duration_label(DurationHours::from_minutes(2880)), "48 hours");
    }

    #[test]
    fn level_and_size_labels() {
        assert_eq!(level_label(ScaleLevel::Standard), "Standard");
        assert_eq!(size_label(1), "1 worker");
        assert_eq!(size_label(20), "20 workers");
    }
}
