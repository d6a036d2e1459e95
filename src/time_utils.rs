// SPDX-License-Identifier: MIT

//! Shared helpers for date/time parsing and formatting.

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_rfc3339_utc(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_offset_and_zulu() {
        let a = parse_rfc3339_utc("2024-03-01T06:00:00Z").unwrap();
        let b = parse_rfc3339_utc("2024-03-01T07:00:00+01:00").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_rfc3339_utc("yesterday morning").is_none());
    }

    #[test]
    fn test_format_uses_zulu_suffix() {
        let dt = parse_rfc3339_utc("2024-03-01T06:00:00Z").unwrap();
        assert_eq!(format_utc_rfc3339(dt), "2024-03-01T06:00:00Z");
    }
}
