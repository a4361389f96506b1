//! Date/time utilities for feedling.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a stored timestamp (RFC3339 or SQLite `YYYY-MM-DD HH:MM:SS`, UTC).
pub fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Parse a stored timestamp, falling back to now for unreadable values.
pub fn parse_datetime_or_now(s: &str) -> DateTime<Utc> {
    parse_datetime(s).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_sqlite_format() {
        let dt = parse_datetime("2024-03-05 07:08:09").unwrap();
        assert_eq!(dt.year(), 2024);
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.day(), 5);
        assert_eq!(dt.hour(), 7);
        assert_eq!(dt.second(), 9);
    }

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = parse_datetime("2024-03-05T09:00:00+02:00").unwrap();
        assert_eq!(dt.hour(), 7);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_datetime("yesterday").is_none());
        assert!(parse_datetime("").is_none());
    }
}
