//! Tally Domain Layer
//!
//! Core types and trait seams for the Tally ingestion engine. Everything
//! else in the workspace depends on this crate; it holds no I/O.
//!
//! ## Key Concepts
//!
//! - **Candidate**: a transaction or asset extracted from free text, not yet persisted
//! - **FinancialData**: the result of one extraction (candidate transactions + candidate assets)
//! - **Transaction**: a persisted expense record
//! - **Asset**: a persisted holding keyed by (institution, institution type, asset name)
//! - **History entry**: an append-only snapshot of an asset's value
//!
//! ## Architecture
//!
//! Infrastructure implements the traits in [`traits`]:
//! - `LedgerStore` is implemented by `tally-store` (SQLite)
//! - `LlmProvider` is implemented by `tally-llm` (OpenAI-compatible, mock)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asset;
pub mod completion;
pub mod error;
pub mod financial_data;
pub mod ids;
pub mod report;
pub mod traits;
pub mod transaction;

// Re-exports for convenience
pub use asset::{
    Asset, AssetHistoryEntry, AssetKey, AssetValue, CandidateAsset, InstitutionType, NewAsset,
    DEFAULT_CURRENCY,
};
pub use error::DomainError;
pub use financial_data::FinancialData;
pub use ids::{AssetId, TransactionId};
pub use report::{CategorySpend, DailySpend, DateRange, TransactionFilter};
pub use transaction::{parse_date, CandidateTransaction, NewTransaction, Transaction, DATE_FORMAT};
