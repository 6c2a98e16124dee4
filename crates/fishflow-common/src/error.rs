//! Error types for scenario data access.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias using DataError.
pub type DataResult<T> = Result<T, DataError>;

/// Failure while loading a dataset from storage.
///
/// None of these reach a caller as a fault: the query layer logs them and
/// reports the dataset as absent.
#[derive(Debug, Error)]
pub enum DataError {
    /// Scenario, file, or keyed entry is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document or record fails structural validation.
    #[error("Malformed {what}: {reason}")]
    Malformed { what: String, reason: String },

    /// Transport-level failure talking to the storage backend.
    #[error("Storage unavailable while reading {what}: {reason}")]
    Unavailable { what: String, reason: String },
}

impl DataError {
    pub fn not_found(what: impl Into<String>) -> Self {
        DataError::NotFound(what.into())
    }

    pub fn malformed(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DataError::Malformed {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    pub fn unavailable(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DataError::Unavailable {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Short label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DataError::NotFound(_) => "not_found",
            DataError::Malformed { .. } => "malformed",
            DataError::Unavailable { .. } => "unavailable",
        }
    }
}

/// A caller-supplied date range violates a scenario's availability.
///
/// Every variant carries the offending bound so the caller can correct the
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("start_date {start} must be before or equal to end_date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("start_date {start} is before earliest available date {earliest}")]
    BeforeEarliest { start: NaiveDate, earliest: NaiveDate },

    #[error("end_date {end} is after latest available date {latest}")]
    AfterLatest { end: NaiveDate, latest: NaiveDate },

    #[error("Date range too large: {days} days requested (maximum {max} days)")]
    RangeTooLarge { days: i64, max: i64 },

    #[error("Scenario {0} does not declare anchor dates")]
    NotDateAnchored(String),
}

impl ValidationError {
    /// Name of the request parameter the caller should change.
    pub fn parameter(&self) -> &'static str {
        match self {
            ValidationError::InvertedRange { .. } | ValidationError::RangeTooLarge { .. } => {
                "start_date,end_date"
            }
            ValidationError::BeforeEarliest { .. } => "start_date",
            ValidationError::AfterLatest { .. } => "end_date",
            ValidationError::NotDateAnchored(_) => "scenario_id",
        }
    }
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::malformed("JSON document", err)
    }
}
