//! Validation errors raised by domain constructors

use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced while building domain values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// Start of a date range falls after its end
    #[error("start date must be on or before end date ({start} > {end})")]
    InvalidDateRange {
        /// Requested start date
        start: NaiveDate,
        /// Requested end date
        end: NaiveDate,
    },

    /// A date string did not match `YYYY-MM-DD`
    #[error("invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate {
        /// The rejected input
        value: String,
    },

    /// Unknown institution type
    #[error("invalid institution type '{0}', expected one of bank, broker, mutual_fund, other")]
    InvalidInstitutionType(String),

    /// An identifier string could not be parsed
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}
