//! Asset reconciliation
//!
//! Decides, per candidate asset, whether it revalues an existing record or
//! creates a new one. Either way exactly one history entry is appended, and
//! the whole read-modify-append runs in one unit of work, so the latest
//! history entry always matches the asset's current value.

use crate::error::IngestError;
use crate::unit_of_work::{atomically, lock_store};
use serde::Serialize;
use std::fmt::Display;
use std::sync::{Arc, Mutex};
use tally_domain::traits::LedgerStore;
use tally_domain::{Asset, AssetId, AssetValue, CandidateAsset, DEFAULT_CURRENCY};
use tracing::{debug, info};

/// What reconciliation did with a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// No asset had the candidate's key; a new one was inserted
    Created,
    /// An asset with the same key was revalued
    Updated,
}

/// An asset after reconciliation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconciledAsset {
    /// Created or updated
    pub outcome: ReconcileOutcome,
    /// The stored asset, as read back after the change
    pub asset: Asset,
}

/// Matches candidate assets against stored ones
pub struct AssetReconciler<S> {
    store: Arc<Mutex<S>>,
}

impl<S> Clone for AssetReconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> AssetReconciler<S>
where
    S: LedgerStore,
    S::Error: Display,
{
    /// Create a reconciler over a shared store
    pub fn new(store: Arc<Mutex<S>>) -> Self {
        Self { store }
    }

    /// Match the candidate by its exact (institution, type, asset name) key
    /// and update or create accordingly
    ///
    /// A leading copy of the institution name is stripped from the asset name
    /// first, so "HDFC Savings Account" at "HDFC" matches "Savings Account".
    pub fn reconcile(&self, candidate: &CandidateAsset) -> Result<ReconciledAsset, IngestError> {
        if candidate.institution_name.trim().is_empty() {
            return Err(IngestError::Validation(
                "institution_name must not be empty".to_string(),
            ));
        }
        if candidate.asset_name.trim().is_empty() {
            return Err(IngestError::Validation(
                "asset_name must not be empty".to_string(),
            ));
        }

        if candidate.repeats_institution() {
            return Err(IngestError::Validation(
                "asset_name must not repeat institution_name".to_string(),
            ));
        }

        let candidate = candidate
            .clone()
            .with_separated_names()
            .with_default_currency();
        let key = candidate.key();
        let value = candidate.value();

        let mut store = lock_store(&self.store)?;
        let reconciled = atomically(&mut *store, IngestError::Reconcile, |store| {
            let existing = store.get_asset_by_key(&key).map_err(reconcile_error)?;

            match existing {
                Some(existing) => {
                    debug!(asset_id = %existing.id, "Asset matched existing record");
                    let asset = apply_value(store, existing.id, &value)?;
                    Ok(ReconciledAsset {
                        outcome: ReconcileOutcome::Updated,
                        asset,
                    })
                }
                None => {
                    let id = store
                        .create_asset(&candidate.to_new_asset())
                        .map_err(reconcile_error)?;
                    store
                        .append_asset_history(id, &value)
                        .map_err(reconcile_error)?;
                    let asset = read_back(store, id)?;
                    Ok(ReconciledAsset {
                        outcome: ReconcileOutcome::Created,
                        asset,
                    })
                }
            }
        })?;

        info!(
            asset_id = %reconciled.asset.id,
            outcome = ?reconciled.outcome,
            "Reconciled asset {} / {}",
            key.institution_name,
            key.asset_name
        );
        Ok(reconciled)
    }

    /// Set a known asset's value, currency and confirmation, appending history
    pub fn revalue(&self, id: AssetId, value: AssetValue) -> Result<Asset, IngestError> {
        let mut value = value;
        if value.currency.trim().is_empty() {
            value.currency = DEFAULT_CURRENCY.to_string();
        }

        let mut store = lock_store(&self.store)?;
        let asset = atomically(&mut *store, IngestError::Reconcile, |store| {
            apply_value(store, id, &value)
        })?;

        info!(asset_id = %id, "Revalued asset");
        Ok(asset)
    }
}

fn apply_value<S>(store: &mut S, id: AssetId, value: &AssetValue) -> Result<Asset, IngestError>
where
    S: LedgerStore,
    S::Error: Display,
{
    if !store.update_asset_value(id, value).map_err(reconcile_error)? {
        return Err(IngestError::NotFound(format!("asset {}", id)));
    }
    store
        .append_asset_history(id, value)
        .map_err(reconcile_error)?;
    read_back(store, id)
}

fn read_back<S>(store: &mut S, id: AssetId) -> Result<Asset, IngestError>
where
    S: LedgerStore,
    S::Error: Display,
{
    store
        .get_asset(id)
        .map_err(reconcile_error)?
        .ok_or_else(|| IngestError::Reconcile(format!("asset {} missing after write", id)))
}

fn reconcile_error(e: impl Display) -> IngestError {
    IngestError::Reconcile(e.to_string())
}
