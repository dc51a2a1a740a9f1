//! Error types for ingestion

use tally_extractor::ExtractionError;
use thiserror::Error;

/// Errors that can occur while ingesting financial data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    /// The extractor failed; passed through unmodified
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// Extraction produced nothing usable
    #[error("No financial data found")]
    NoFinancialData,

    /// A transaction date is not a valid `YYYY-MM-DD` date
    #[error("Invalid date at transaction {index}: '{value}'")]
    InvalidDate {
        /// Position of the offending candidate in the batch
        index: usize,
        /// The rejected value
        value: String,
    },

    /// An asset could not be matched, created or revalued
    #[error("Reconcile error: {0}")]
    Reconcile(String),

    /// The referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A field failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Store error outside a reconciliation
    #[error("Store error: {0}")]
    Store(String),
}
