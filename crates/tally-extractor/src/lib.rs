//! Tally Extractor
//!
//! Turns a free-text description of financial events into typed candidates
//! by asking an LLM to call a single `parse_financial_data` tool.
//!
//! # Architecture
//!
//! ```text
//! Text → Extractor → LlmProvider → tool call → FinancialData
//! ```
//!
//! The extractor owns one long-lived provider handle. Everything that can go
//! wrong is classified into [`ExtractionError`] so callers can tell bad input
//! from a misbehaving model.
//!
//! # Example Usage
//!
//! ```
//! use tally_extractor::{Extractor, ExtractorConfig};
//! use tally_llm::MockProvider;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::with_tool_call(
//!     "parse_financial_data",
//!     r#"{"transactions":[{"transaction_date":"2024-05-01","amount":12,
//!         "category":"food","description":"lunch"}]}"#,
//! );
//! let extractor = Extractor::new(llm, ExtractorConfig::default());
//!
//! let data = extractor.extract("I spent $12 on lunch").await?;
//! assert_eq!(data.transactions.len(), 1);
//! assert_eq!(data.transactions[0].currency, "USD");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod parser;
mod prompt;
mod schema;

#[cfg(test)]
mod tests;

pub use config::ExtractorConfig;
pub use error::ExtractionError;
pub use extractor::Extractor;
pub use parser::{classify_response, parse_tool_arguments};
pub use prompt::PromptBuilder;
pub use schema::{financial_data_tool, TOOL_NAME};
