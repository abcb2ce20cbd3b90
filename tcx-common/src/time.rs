//! Timestamp utilities

use chrono::{DateTime, NaiveDateTime, Utc};

/// Compact UTC stamp used in artifact file names
const ARTIFACT_STAMP_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Format a timestamp for use in an artifact file name
pub fn artifact_stamp(at: DateTime<Utc>) -> String {
    at.format(ARTIFACT_STAMP_FORMAT).to_string()
}

/// Parse a stamp produced by [`artifact_stamp`]
pub fn parse_artifact_stamp(stamp: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(stamp, ARTIFACT_STAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Convert fractional milliseconds from a [`std::time::Duration`]
pub fn duration_millis(duration: std::time::Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::time::Duration;

    #[test]
    fn test_now_returns_valid_timestamp() {
        let timestamp = now();
        // After 2000-01-01, before 2100-01-01
        assert!(timestamp.timestamp() > 946_684_800);
        assert!(timestamp.timestamp() < 4_102_444_800);
    }

    #[test]
    fn test_artifact_stamp_format() {
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(artifact_stamp(at), "20260314T092653Z");
    }

    #[test]
    fn test_artifact_stamp_parses_back() {
        let at = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 1).unwrap();
        assert_eq!(parse_artifact_stamp(&artifact_stamp(at)), Some(at));
    }

    #[test]
    fn test_parse_artifact_stamp_rejects_garbage() {
        assert!(parse_artifact_stamp("yesterday").is_none());
        assert!(parse_artifact_stamp("").is_none());
    }

    #[test]
    fn test_duration_millis() {
        assert_eq!(duration_millis(Duration::from_millis(250)), 250.0);
        assert_eq!(duration_millis(Duration::from_micros(1500)), 1.5);
    }
}
