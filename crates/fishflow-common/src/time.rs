//! Date handling for scenario datasets.
//!
//! Every date on disk is a `YYYY-MM-DD` string, monthly tables are keyed by
//! `YYYY-MM`, and occupancy timestamps keep the UTC offset they were stored
//! with.

use chrono::{DateTime, Days, FixedOffset, NaiveDate};

/// Format used for date fields in metadata and as array-store keys.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Format used to name monthly snapshot tables.
pub const MONTH_FORMAT: &str = "%Y-%m";

/// Format used when serializing occupancy timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimeParseError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| TimeParseError::InvalidDate(s.to_string()))
}

/// Parse an ISO-8601 timestamp, keeping its UTC offset.
///
/// Accepts RFC 3339 (`2022-01-01T06:00:00+00:00`, `...Z`) and the compact
/// offset form (`2022-01-01T06:00:00+0000`).
pub fn parse_timestamp(s: &str) -> Result<DateTime<FixedOffset>, TimeParseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    DateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|_| TimeParseError::InvalidTimestamp(s.to_string()))
}

/// Render a timestamp for clients.
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Key of the array-store entry holding a date's matrix.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Key of the monthly snapshot table covering `date`.
pub fn month_key(date: NaiveDate) -> String {
    date.format(MONTH_FORMAT).to_string()
}

/// Number of calendar days in `[start, end]`, counting both ends.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// An inclusive range of calendar dates, iterated in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of dates in the range (zero when inverted).
    pub fn len(&self) -> i64 {
        inclusive_days(self.start, self.end).max(0)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    /// Iterate every date from `start` through `end`.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), |d| d.succ_opt())
            .take_while(move |d| *d <= end)
    }
}

/// Offset a date by a signed number of days. `None` when the result falls
/// outside the representable calendar.
pub fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid date (expected YYYY-MM-DD): {0}")]
    InvalidDate(String),

    #[error("Invalid ISO-8601 timestamp: {0}")]
    InvalidTimestamp(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2022-07-01").unwrap(), date(2022, 7, 1));
        assert!(parse_date("2022/07/01").is_err());
        assert!(parse_date("2022-02-30").is_err());
    }

    #[test]
    fn test_month_key_uses_any_day_in_month() {
        assert_eq!(month_key(date(2024, 1, 1)), "2024-01");
        assert_eq!(month_key(date(2024, 1, 31)), "2024-01");
    }

    #[test]
    fn test_timestamp_keeps_offset() {
        let ts = parse_timestamp("2022-03-01T06:00:00-08:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2022-03-01T06:00:00-0800");

        let compact = parse_timestamp("2022-03-01T06:00:00+0000").unwrap();
        assert_eq!(format_timestamp(&compact), "2022-03-01T06:00:00+0000");

        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let range = DateRange::new(date(2021, 12, 30), date(2022, 1, 2));
        let days: Vec<String> = range.days().map(date_key).collect();
        assert_eq!(days, vec!["2021-12-30", "2021-12-31", "2022-01-01", "2022-01-02"]);
        assert_eq!(range.len(), 4);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let range = DateRange::new(date(2022, 1, 2), date(2022, 1, 1));
        assert!(range.is_empty());
        assert_eq!(range.len(), 0);
        assert_eq!(range.days().count(), 0);
    }

    #[test]
    fn test_shift_days() {
        assert_eq!(shift_days(date(2022, 1, 1), -14), Some(date(2021, 12, 18)));
        assert_eq!(shift_days(date(2022, 7, 1), 14), Some(date(2022, 7, 15)));
        assert_eq!(shift_days(date(2022, 1, 1), 0), Some(date(2022, 1, 1)));
    }

    #[test]
    fn test_shift_days_out_of_range() {
        assert_eq!(shift_days(date(2022, 1, 1), 200_000_000), None);
        assert_eq!(shift_days(date(2022, 1, 1), -200_000_000), None);
        assert_eq!(shift_days(NaiveDate::MAX, 1), None);
        assert_eq!(shift_days(date(2022, 1, 1), i64::MIN), None);
    }

    #[test]
    fn test_single_day_range() {
        let d = date(2022, 1, 1);
        assert_eq!(inclusive_days(d, d), 1);
        assert_eq!(DateRange::new(d, d).days().count(), 1);
    }
}
