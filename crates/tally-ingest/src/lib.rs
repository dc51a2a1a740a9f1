//! Tally Ingest
//!
//! Turns extracted candidates into persisted records.
//!
//! # Architecture
//!
//! ```text
//! Text → Extractor → FinancialData ─┬→ AssetReconciler → assets + history
//!                                   └→ TransactionIngestor → transactions
//! ```
//!
//! The reconciler and the ingestor share one store behind a mutex. Every
//! multi-step change runs inside a store unit of work, so a failure leaves
//! no partial writes behind.
//!
//! # Example Usage
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use tally_extractor::{Extractor, ExtractorConfig};
//! use tally_ingest::Orchestrator;
//! use tally_llm::MockProvider;
//! use tally_store::SqliteStore;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let llm = MockProvider::with_tool_call(
//!     "parse_financial_data",
//!     r#"{"assets":[{"institution_name":"HDFC","institution_type":"bank",
//!         "asset_name":"Savings Account","current_value":5000}]}"#,
//! );
//! let store = Arc::new(Mutex::new(SqliteStore::open_in_memory()?));
//! let orchestrator = Orchestrator::new(Extractor::new(llm, ExtractorConfig::default()), store);
//!
//! let result = orchestrator.process("My HDFC savings account has $5000").await?;
//! assert_eq!(result.assets.len(), 1);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod ingestor;
mod orchestrator;
mod reconciler;
mod unit_of_work;

pub use error::IngestError;
pub use ingestor::TransactionIngestor;
pub use orchestrator::{AssetFailure, IngestionResult, Orchestrator};
pub use reconciler::{AssetReconciler, ReconcileOutcome, ReconciledAsset};
