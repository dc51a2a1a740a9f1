//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Input was empty or only whitespace; the model was not called
    #[error("Input text is empty")]
    EmptyInput,

    /// Input exceeds the configured maximum length
    #[error("Input too long: {length} chars (max: {max})")]
    InputTooLong {
        /// Length of the rejected input
        length: usize,
        /// Configured maximum
        max: usize,
    },

    /// The model call failed, timed out or returned an unusable envelope
    #[error("Model call failed: {0}")]
    Transport(String),

    /// Tool arguments did not match the expected schema
    #[error("Could not decode tool arguments: {0}")]
    Decode(String),

    /// The model neither called the tool nor finished normally
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// The model found nothing to record; `reply` is its plain-text answer, if any
    #[error("No financial data found")]
    NoFinancialData {
        /// What the model said instead of calling the tool
        reply: Option<String>,
    },
}

impl From<serde_json::Error> for ExtractionError {
    fn from(e: serde_json::Error) -> Self {
        ExtractionError::Decode(e.to_string())
    }
}
