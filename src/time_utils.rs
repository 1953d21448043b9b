// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.
//!
//! Timestamps are stored as RFC3339 strings with whole seconds and a `Z`
//! suffix, so lexical order in Firestore matches chronological order.

use chrono::{DateTime, SecondsFormat, Timelike, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Drop sub-second precision.
pub fn truncate_to_seconds(date: DateTime<Utc>) -> DateTime<Utc> {
    date.with_nanosecond(0).unwrap_or(date)
}

/// Current time, truncated to whole seconds.
pub fn now() -> DateTime<Utc> {
    truncate_to_seconds(Utc::now())
}

/// Parse an RFC3339 timestamp into UTC.
pub fn parse_utc_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| truncate_to_seconds(dt.with_timezone(&Utc)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_round_trips_through_parse() {
        let ts = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        let formatted = format_utc_rfc3339(ts);
        assert_eq!(formatted, "2026-01-15T09:00:00Z");
        assert_eq!(parse_utc_rfc3339(&formatted), Some(ts));
    }

    #[test]
    fn test_parse_normalizes_offsets() {
        let parsed = parse_utc_rfc3339("2026-01-15T14:30:00.750+05:30").unwrap();
        assert_eq!(format_utc_rfc3339(parsed), "2026-01-15T09:00:00Z");
    }
}
