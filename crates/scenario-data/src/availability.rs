//! Temporal availability of date-anchored scenarios.
//!
//! Data exists within `maximum_window_size` days of each anchor date. A
//! requested range must lie inside the union of those windows and span at
//! most [`MAX_REQUEST_DAYS`] days.

use chrono::NaiveDate;

use fishflow_common::time::{inclusive_days, shift_days};
use fishflow_common::{DateRange, ScenarioSummary, ValidationError};

/// Largest inclusive date range a single movement request may cover.
pub const MAX_REQUEST_DAYS: i64 = 60;

/// Earliest and latest date with data, both inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct AvailabilityWindow {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
}

impl AvailabilityWindow {
    /// `earliest = min(anchor) - window`, `latest = max(anchor) + window`.
    ///
    /// `None` without anchors, or when a bound falls outside the calendar.
    pub fn from_anchors(anchors: &[NaiveDate], window_days: u32) -> Option<Self> {
        let window = i64::from(window_days);
        let earliest = shift_days(*anchors.iter().min()?, -window)?;
        let latest = shift_days(*anchors.iter().max()?, window)?;
        Some(Self { earliest, latest })
    }

    pub fn for_scenario(scenario: &ScenarioSummary) -> Result<Self, ValidationError> {
        scenario
            .anchors()
            .and_then(|(anchors, window)| Self::from_anchors(anchors, window))
            .ok_or_else(|| ValidationError::NotDateAnchored(scenario.scenario_id.clone()))
    }

    /// Check a requested inclusive range.
    ///
    /// Checks run in a fixed order so the reported bound is deterministic:
    /// inverted range, start bound, end bound, then size.
    pub fn validate(&self, start: NaiveDate, end: NaiveDate) -> Result<DateRange, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedRange { start, end });
        }
        if start < self.earliest {
            return Err(ValidationError::BeforeEarliest {
                start,
                earliest: self.earliest,
            });
        }
        if end > self.latest {
            return Err(ValidationError::AfterLatest {
                end,
                latest: self.latest,
            });
        }

        let days = inclusive_days(start, end);
        if days > MAX_REQUEST_DAYS {
            return Err(ValidationError::RangeTooLarge {
                days,
                max: MAX_REQUEST_DAYS,
            });
        }

        Ok(DateRange::new(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        fishflow_common::time::parse_date(s).unwrap()
    }

    fn demo_window() -> AvailabilityWindow {
        AvailabilityWindow::from_anchors(&[date("2022-01-01"), date("2022-07-01")], 14).unwrap()
    }

    #[test]
    fn test_window_bounds() {
        let window = demo_window();
        assert_eq!(window.earliest, date("2021-12-18"));
        assert_eq!(window.latest, date("2022-07-15"));
    }

    #[test]
    fn test_anchor_order_does_not_matter() {
        let a = AvailabilityWindow::from_anchors(&[date("2022-07-01"), date("2022-01-01")], 14);
        assert_eq!(a, Some(demo_window()));
    }

    #[test]
    fn test_no_anchors_no_window() {
        assert!(AvailabilityWindow::from_anchors(&[], 14).is_none());
    }

    #[test]
    fn test_lower_bound_is_inclusive() {
        let window = demo_window();
        let range = window.validate(date("2021-12-18"), date("2021-12-19")).unwrap();
        assert_eq!(range.len(), 2);

        assert_eq!(
            window.validate(date("2021-12-17"), date("2021-12-18")),
            Err(ValidationError::BeforeEarliest {
                start: date("2021-12-17"),
                earliest: date("2021-12-18"),
            })
        );
    }

    #[test]
    fn test_upper_bound_is_inclusive() {
        let window = demo_window();
        assert!(window.validate(date("2022-07-15"), date("2022-07-15")).is_ok());
        assert!(matches!(
            window.validate(date("2022-07-10"), date("2022-07-16")),
            Err(ValidationError::AfterLatest { .. })
        ));
    }

    #[test]
    fn test_inverted_range_reported_first() {
        let window = demo_window();
        assert!(matches!(
            window.validate(date("2021-01-02"), date("2021-01-01")),
            Err(ValidationError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_sixty_day_cap() {
        let window = AvailabilityWindow::from_anchors(&[date("2022-06-01")], 120).unwrap();

        let start = date("2022-05-01");
        assert!(window.validate(start, shift_days(start, 59).unwrap()).is_ok());
        assert_eq!(
            window.validate(start, shift_days(start, 60).unwrap()),
            Err(ValidationError::RangeTooLarge { days: 61, max: 60 })
        );
    }

    #[test]
    fn test_window_zero_is_anchor_only() {
        let window = AvailabilityWindow::from_anchors(&[date("2022-01-01")], 0).unwrap();
        assert!(window.validate(date("2022-01-01"), date("2022-01-01")).is_ok());
        assert!(window.validate(date("2022-01-01"), date("2022-01-02")).is_err());
    }

    #[test]
    fn test_unrepresentable_window_is_rejected_not_panicking() {
        assert_eq!(AvailabilityWindow::from_anchors(&[date("2022-01-01")], 200_000_000), None);
        assert_eq!(AvailabilityWindow::from_anchors(&[], 14), None);
    }
}
