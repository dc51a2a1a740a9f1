//! Ingestion orchestration: text in, persisted records out

use crate::error::IngestError;
use crate::ingestor::TransactionIngestor;
use crate::reconciler::{AssetReconciler, ReconciledAsset};
use serde::Serialize;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tally_domain::traits::{LedgerStore, LlmProvider};
use tally_domain::{FinancialData, Transaction};
use tally_extractor::Extractor;
use tracing::{info, warn};

/// An asset candidate that could not be reconciled
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetFailure {
    /// Position of the candidate in the extraction
    pub index: usize,
    /// Institution of the candidate
    pub institution_name: String,
    /// Asset name of the candidate
    pub asset_name: String,
    /// Why it failed
    pub reason: String,
}

/// Everything one call to [`Orchestrator::process`] stored
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionResult {
    /// Assets created or updated, in extraction order
    pub assets: Vec<ReconciledAsset>,
    /// Assets that failed while at least one other succeeded
    pub asset_failures: Vec<AssetFailure>,
    /// Transactions created, in extraction order
    pub transactions: Vec<Transaction>,
}

/// Runs extraction, then reconciliation and ingestion
pub struct Orchestrator<L, S>
where
    L: LlmProvider,
{
    extractor: Extractor<L>,
    reconciler: AssetReconciler<S>,
    ingestor: TransactionIngestor<S>,
}

impl<L, S> Orchestrator<L, S>
where
    L: LlmProvider,
    S: LedgerStore,
    S::Error: Display,
{
    /// Create an orchestrator over an extractor and a shared store
    pub fn new(extractor: Extractor<L>, store: Arc<Mutex<S>>) -> Self {
        Self {
            extractor,
            reconciler: AssetReconciler::new(Arc::clone(&store)),
            ingestor: TransactionIngestor::new(store),
        }
    }

    /// The extractor in front of the store
    pub fn extractor(&self) -> &Extractor<L> {
        &self.extractor
    }

    /// The asset reconciler, for callers that create or revalue assets directly
    pub fn reconciler(&self) -> &AssetReconciler<S> {
        &self.reconciler
    }

    /// The transaction ingestor, for callers that edit transactions directly
    pub fn ingestor(&self) -> &TransactionIngestor<S> {
        &self.ingestor
    }

    /// Extract financial data from `text` and persist it
    pub async fn process(&self, text: &str) -> Result<IngestionResult, IngestError> {
        let data = self.extractor.extract(text).await?;
        self.store_extracted(data)
    }

    /// Persist already-extracted data
    ///
    /// Transactions are validated before anything is written, so a bad date
    /// leaves the store untouched. Every asset is then reconciled on its own.
    /// If assets were present and none of them succeeded, the first failure
    /// is returned and no transaction is written.
    pub fn store_extracted(&self, data: FinancialData) -> Result<IngestionResult, IngestError> {
        if data.is_empty() {
            return Err(IngestError::NoFinancialData);
        }

        let transactions = self.ingestor.validate(&data.transactions)?;

        let mut result = IngestionResult::default();
        let mut first_error = None;

        for (index, candidate) in data.assets.iter().enumerate() {
            match self.reconciler.reconcile(candidate) {
                Ok(reconciled) => result.assets.push(reconciled),
                Err(e) => {
                    warn!(index, error = %e, "Failed to reconcile asset");
                    result.asset_failures.push(AssetFailure {
                        index,
                        institution_name: candidate.institution_name.clone(),
                        asset_name: candidate.asset_name.clone(),
                        reason: e.to_string(),
                    });
                    first_error.get_or_insert(e);
                }
            }
        }

        if !data.assets.is_empty() && result.assets.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }

        result.transactions = self.ingestor.insert(&transactions)?;

        info!(
            "Processed input: {} assets, {} asset failures, {} transactions",
            result.assets.len(),
            result.asset_failures.len(),
            result.transactions.len()
        );
        Ok(result)
    }
}
