//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Infrastructure implementations live in other crates.

use crate::completion::{ChatRequest, ChatResponse};
use crate::{
    Asset, AssetHistoryEntry, AssetId, AssetKey, AssetValue, CategorySpend, DailySpend, DateRange,
    NewAsset, NewTransaction, Transaction, TransactionFilter, TransactionId,
};
use async_trait::async_trait;

/// Trait for persisting transactions and assets
///
/// Implemented by the infrastructure layer (tally-store).
///
/// Multi-step changes are grouped with [`begin`](LedgerStore::begin),
/// [`commit`](LedgerStore::commit) and [`rollback`](LedgerStore::rollback).
/// Between `begin` and `commit` the store must isolate the caller from
/// concurrent writers.
pub trait LedgerStore {
    /// Error type for store operations
    type Error;

    /// Start a unit of work
    fn begin(&mut self) -> Result<(), Self::Error>;

    /// Make the current unit of work durable
    fn commit(&mut self) -> Result<(), Self::Error>;

    /// Discard the current unit of work
    fn rollback(&mut self) -> Result<(), Self::Error>;

    /// Insert a transaction and return the stored record
    fn create_transaction(&mut self, tx: &NewTransaction) -> Result<Transaction, Self::Error>;

    /// Get a transaction by ID
    fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, Self::Error>;

    /// List transactions matching the filter, newest first
    fn list_transactions(&self, filter: &TransactionFilter)
        -> Result<Vec<Transaction>, Self::Error>;

    /// Replace every field of a transaction; `false` if the ID is unknown
    fn update_transaction(
        &mut self,
        id: TransactionId,
        tx: &NewTransaction,
    ) -> Result<bool, Self::Error>;

    /// Hard-delete a transaction; `false` if the ID is unknown
    fn delete_transaction(&mut self, id: TransactionId) -> Result<bool, Self::Error>;

    /// Totals per category inside the range, largest first, at most `limit` rows
    fn spending_by_category(
        &self,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<CategorySpend>, Self::Error>;

    /// Totals per day inside the range, oldest first
    fn spending_by_day(&self, range: &DateRange) -> Result<Vec<DailySpend>, Self::Error>;

    /// Find an asset by its exact key
    fn get_asset_by_key(&self, key: &AssetKey) -> Result<Option<Asset>, Self::Error>;

    /// Insert an asset and return its new ID
    fn create_asset(&mut self, asset: &NewAsset) -> Result<AssetId, Self::Error>;

    /// Set value, currency and confirmation; `false` if the ID is unknown
    fn update_asset_value(&mut self, id: AssetId, value: &AssetValue)
        -> Result<bool, Self::Error>;

    /// Append a history entry for an asset
    fn append_asset_history(
        &mut self,
        id: AssetId,
        value: &AssetValue,
    ) -> Result<AssetHistoryEntry, Self::Error>;

    /// Get an asset by ID
    fn get_asset(&self, id: AssetId) -> Result<Option<Asset>, Self::Error>;

    /// List assets, optionally only those with the given confirmation flag
    fn list_assets(&self, confirm: Option<bool>) -> Result<Vec<Asset>, Self::Error>;

    /// History of an asset, oldest first
    fn asset_history(&self, id: AssetId) -> Result<Vec<AssetHistoryEntry>, Self::Error>;

    /// Delete an asset together with its history; `false` if the ID is unknown
    fn delete_asset(&mut self, id: AssetId) -> Result<bool, Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (tally-llm). Implementations
/// must be cancel-safe: dropping the returned future abandons the call.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Error type for LLM operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run one chat completion
    async fn complete(&self, request: ChatRequest) -> Result<ChatResponse, Self::Error>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}
