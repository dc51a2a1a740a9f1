//! Transaction ingestion

use crate::error::IngestError;
use crate::unit_of_work::{atomically, lock_store};
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tally_domain::traits::LedgerStore;
use tally_domain::{
    CandidateTransaction, DomainError, NewTransaction, Transaction, TransactionId,
    DEFAULT_CURRENCY,
};
use tracing::{debug, info};

/// Validates candidate transactions and persists them
pub struct TransactionIngestor<S> {
    store: Arc<Mutex<S>>,
}

impl<S> Clone for TransactionIngestor<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> TransactionIngestor<S>
where
    S: LedgerStore,
    S::Error: Display,
{
    /// Create an ingestor over a shared store
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }

    /// Persist every candidate as its own transaction, in order
    ///
    /// All dates are validated before anything is written, and the batch is
    /// inserted in one unit of work: either every candidate is stored or none.
    pub fn ingest(
        &self,
        candidates: &[CandidateTransaction],
    ) -> Result<Vec<Transaction>, IngestError> {
        let validated = self.validate(candidates)?;
        self.insert(&validated)
    }

    /// Check every candidate without touching the store
    ///
    /// Fails on the first bad date with its index; blank currencies become USD.
    pub fn validate(
        &self,
        candidates: &[CandidateTransaction],
    ) -> Result<Vec<NewTransaction>, IngestError> {
        candidates
            .iter()
            .enumerate()
            .map(|(index, candidate)| validate_candidate(index, candidate))
            .collect()
    }

    /// Insert an already validated batch in one unit of work
    pub fn insert(&self, validated: &[NewTransaction]) -> Result<Vec<Transaction>, IngestError> {
        if validated.is_empty() {
            return Ok(Vec::new());
        }

        let mut store = lock_store(&self.store)?;
        let created = atomically(&mut *store, IngestError::Store, |store| {
            validated
                .iter()
                .map(|tx| {
                    store
                        .create_transaction(tx)
                        .map_err(|e| IngestError::Store(e.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        info!("Ingested {} transactions", created.len());
        Ok(created)
    }

    /// Replace every field of an existing transaction
    pub fn replace(
        &self,
        id: TransactionId,
        candidate: &CandidateTransaction,
    ) -> Result<Transaction, IngestError> {
        let tx = validate_candidate(0, candidate)?;

        let mut store = lock_store(&self.store)?;
        if !store
            .update_transaction(id, &tx)
            .map_err(|e| IngestError::Store(e.to_string()))?
        {
            return Err(IngestError::NotFound(format!("transaction {}", id)));
        }
        debug!(transaction_id = %id, "Replaced transaction");

        store
            .get_transaction(id)
            .map_err(|e| IngestError::Store(e.to_string()))?
            .ok_or_else(|| IngestError::NotFound(format!("transaction {}", id)))
    }
}

fn validate_candidate(
    index: usize,
    candidate: &CandidateTransaction,
) -> Result<NewTransaction, IngestError> {
    let mut tx = candidate.validate().map_err(|e| match e {
        DomainError::InvalidDate { value } => IngestError::InvalidDate { index, value },
        other => IngestError::Validation(other.to_string()),
    })?;
    if tx.currency.trim().is_empty() {
        tx.currency = DEFAULT_CURRENCY.to_string();
    }
    Ok(tx)
}
