//! Feed time handling.
//!
//! The feed reports times as RFC 3339 timestamps with a local offset
//! (`2025-01-10T08:15:00-05:00`). Callers may also pass a bare clock time
//! (`08:15`), which is read on the reference date in the reference offset.

use chrono::{DateTime, FixedOffset, NaiveTime, TimeZone};

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parse a feed or request time.
///
/// Accepts RFC 3339, or `HH:MM` / `HH:MM:SS` anchored to `reference`.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use transit_planner::domain::parse_feed_time;
///
/// let now = DateTime::parse_from_rfc3339("2025-01-10T07:00:00-05:00").unwrap();
/// let t = parse_feed_time("08:15", now).unwrap();
/// assert_eq!(t.to_rfc3339(), "2025-01-10T08:15:00-05:00");
/// ```
pub fn parse_feed_time(
    s: &str,
    reference: DateTime<FixedOffset>,
) -> Result<DateTime<FixedOffset>, TimeError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(TimeError::new(s, "empty"));
    }

    if let Ok(t) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(t);
    }

    let clock = NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| TimeError::new(s, "expected RFC 3339 or HH:MM[:SS]"))?;

    let naive = reference.date_naive().and_time(clock);
    reference
        .offset()
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| TimeError::new(s, "ambiguous local time"))
}

/// Whole minutes from `from` to `to`, truncated toward zero.
pub fn minutes_between(from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> i64 {
    to.signed_duration_since(from).num_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn parse_rfc3339() {
        let reference = at("2025-01-10T07:00:00-05:00");
        let t = parse_feed_time("2025-01-11T09:30:00-05:00", reference).unwrap();
        assert_eq!(t, at("2025-01-11T09:30:00-05:00"));
    }

    #[test]
    fn parse_clock_time_uses_reference_date_and_offset() {
        let reference = at("2025-07-04T12:00:00-04:00");

        let t = parse_feed_time("18:05", reference).unwrap();
        assert_eq!(t, at("2025-07-04T18:05:00-04:00"));

        let t = parse_feed_time("06:00:30", reference).unwrap();
        assert_eq!(t, at("2025-07-04T06:00:30-04:00"));
    }

    #[test]
    fn parse_rejects_garbage() {
        let reference = at("2025-01-10T07:00:00-05:00");
        assert!(parse_feed_time("", reference).is_err());
        assert!(parse_feed_time("soon", reference).is_err());
        assert!(parse_feed_time("25:00", reference).is_err());

        let err = parse_feed_time("soon", reference).unwrap_err();
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn minutes_between_truncates() {
        let a = at("2025-01-10T08:00:00-05:00");
        let b = at("2025-01-10T08:12:59-05:00");
        assert_eq!(minutes_between(a, b), 12);
        assert_eq!(minutes_between(b, a), -12);
        assert_eq!(minutes_between(a, a), 0);
    }

    #[test]
    fn minutes_between_across_offsets() {
        let a = at("2025-01-10T08:00:00-05:00");
        let b = at("2025-01-10T13:30:00+00:00");
        assert_eq!(minutes_between(a, b), 30);
    }
}
