//! Tally Storage Layer
//!
//! Implements the `LedgerStore` trait on SQLite.
//!
//! # Architecture
//!
//! - One table per record kind: `transactions`, `assets`, `asset_history`
//! - Money is stored as decimal text and summed in Rust, so totals are exact
//! - Units of work use `BEGIN IMMEDIATE`, which takes the write lock up
//!   front; two writers reconciling the same asset are serialized
//! - `asset_history` rows cascade when their asset is deleted
//!
//! # Examples
//!
//! ```no_run
//! use tally_store::SqliteStore;
//!
//! let store = SqliteStore::new("tally.db").unwrap();
//! // Store is now ready for ledger operations
//! ```

#![warn(missing_docs)]

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tally_domain::traits::LedgerStore;
use tally_domain::{
    Asset, AssetHistoryEntry, AssetId, AssetKey, AssetValue, CategorySpend, DailySpend, DateRange,
    InstitutionType, NewAsset, NewTransaction, Transaction, TransactionFilter, TransactionId,
};
use thiserror::Error;
use tracing::debug;

/// How long a writer waits for the database lock before giving up
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TRANSACTION_COLUMNS: &str =
    "id, created_at, transaction_date, currency, amount, category, description, confirm";

const ASSET_COLUMNS: &str = "id, created_at, institution_name, institution_type, asset_name, \
     current_value, currency, last_updated, description, confirm";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-based implementation of LedgerStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store between tasks by
/// wrapping it in a mutex, or open one store per thread.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tally_store::SqliteStore;
    ///
    /// let store = SqliteStore::new("tally.db").unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create a store backed by a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(":memory:")
    }

    /// Initialize connection settings and the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        self.conn.busy_timeout(BUSY_TIMEOUT)?;
        // Needed for ON DELETE CASCADE; SQLite keeps it off by default
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(include_str!("schema.sql"))?;
        Ok(())
    }

    fn decimal_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
        let text: String = row.get(idx)?;
        Decimal::from_str(&text)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    }

    fn transaction_id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<TransactionId> {
        let bytes: Vec<u8> = row.get(idx)?;
        TransactionId::from_bytes(&bytes)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(e)))
    }

    fn asset_id_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<AssetId> {
        let bytes: Vec<u8> = row.get(idx)?;
        AssetId::from_bytes(&bytes)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Blob, Box::new(e)))
    }

    fn row_to_transaction(row: &Row<'_>) -> rusqlite::Result<Transaction> {
        Ok(Transaction {
            id: Self::transaction_id_at(row, 0)?,
            created_at: row.get(1)?,
            transaction_date: row.get(2)?,
            currency: row.get(3)?,
            amount: Self::decimal_at(row, 4)?,
            category: row.get(5)?,
            description: row.get(6)?,
            confirm: row.get(7)?,
        })
    }

    fn row_to_asset(row: &Row<'_>) -> rusqlite::Result<Asset> {
        let kind: String = row.get(3)?;
        let institution_type = InstitutionType::from_str(&kind)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

        Ok(Asset {
            id: Self::asset_id_at(row, 0)?,
            created_at: row.get(1)?,
            institution_name: row.get(2)?,
            institution_type,
            asset_name: row.get(4)?,
            current_value: Self::decimal_at(row, 5)?,
            currency: row.get(6)?,
            last_updated: row.get(7)?,
            description: row.get(8)?,
            confirm: row.get(9)?,
        })
    }

    fn row_to_history(row: &Row<'_>) -> rusqlite::Result<AssetHistoryEntry> {
        Ok(AssetHistoryEntry {
            id: row.get(0)?,
            asset_id: Self::asset_id_at(row, 1)?,
            value_date: row.get(2)?,
            value: Self::decimal_at(row, 3)?,
            currency: row.get(4)?,
        })
    }

    /// (date, category, amount) for every transaction inside the range
    fn amounts_in_range(
        &self,
        range: &DateRange,
    ) -> Result<Vec<(NaiveDate, String, Decimal)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT transaction_date, category, amount FROM transactions
             WHERE transaction_date BETWEEN ?1 AND ?2",
        )?;

        let rows: Vec<(NaiveDate, String, Decimal)> = stmt
            .query_map(params![range.start(), range.end()], |row| {
                Ok((row.get(0)?, row.get(1)?, Self::decimal_at(row, 2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

/// Add to a running report total without panicking on overflow
fn add_amount(total: Decimal, amount: Decimal) -> Result<Decimal, StoreError> {
    total
        .checked_add(amount)
        .ok_or_else(|| StoreError::InvalidData("total overflows".to_string()))
}

impl LedgerStore for SqliteStore {
    type Error = StoreError;

    fn begin(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Self::Error> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn create_transaction(&mut self, tx: &NewTransaction) -> Result<Transaction, Self::Error> {
        let record = Transaction {
            id: TransactionId::new(),
            created_at: Utc::now(),
            transaction_date: tx.transaction_date,
            amount: tx.amount,
            currency: tx.currency.clone(),
            category: tx.category.clone(),
            description: tx.description.clone(),
            confirm: tx.confirm,
        };

        self.conn.execute(
            "INSERT INTO transactions (id, created_at, transaction_date, currency, amount, category, description, confirm)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &record.id.to_bytes()[..],
                record.created_at,
                record.transaction_date,
                &record.currency,
                record.amount.to_string(),
                &record.category,
                &record.description,
                record.confirm,
            ],
        )?;

        debug!("Inserted transaction {}", record.id);
        Ok(record)
    }

    fn get_transaction(&self, id: TransactionId) -> Result<Option<Transaction>, Self::Error> {
        let sql = format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLUMNS);
        let tx = self
            .conn
            .query_row(&sql, params![&id.to_bytes()[..]], Self::row_to_transaction)
            .optional()?;
        Ok(tx)
    }

    fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>, Self::Error> {
        let mut sql = format!("SELECT {} FROM transactions WHERE 1=1", TRANSACTION_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(confirm) = filter.confirm {
            sql.push_str(" AND confirm = ?");
            params.push(Box::new(confirm));
        }

        if let Some(start) = filter.start_date {
            sql.push_str(" AND transaction_date >= ?");
            params.push(Box::new(start));
        }

        if let Some(end) = filter.end_date {
            sql.push_str(" AND transaction_date <= ?");
            params.push(Box::new(end));
        }

        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let transactions = stmt
            .query_map(&param_refs[..], Self::row_to_transaction)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(transactions)
    }

    fn update_transaction(
        &mut self,
        id: TransactionId,
        tx: &NewTransaction,
    ) -> Result<bool, Self::Error> {
        let changed = self.conn.execute(
            "UPDATE transactions
             SET transaction_date = ?1, currency = ?2, amount = ?3, category = ?4, description = ?5, confirm = ?6
             WHERE id = ?7",
            params![
                tx.transaction_date,
                &tx.currency,
                tx.amount.to_string(),
                &tx.category,
                &tx.description,
                tx.confirm,
                &id.to_bytes()[..],
            ],
        )?;
        Ok(changed > 0)
    }

    fn delete_transaction(&mut self, id: TransactionId) -> Result<bool, Self::Error> {
        let changed = self.conn.execute(
            "DELETE FROM transactions WHERE id = ?1",
            params![&id.to_bytes()[..]],
        )?;
        Ok(changed > 0)
    }

    fn spending_by_category(
        &self,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<CategorySpend>, Self::Error> {
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for (_, category, amount) in self.amounts_in_range(range)? {
            let total = totals.entry(category).or_insert(Decimal::ZERO);
            *total = add_amount(*total, amount)?;
        }

        let mut summary: Vec<CategorySpend> = totals
            .into_iter()
            .map(|(category, total_spent)| CategorySpend {
                category,
                total_spent,
            })
            .collect();

        // Largest first; name breaks ties so output is stable
        summary.sort_by(|a, b| {
            b.total_spent
                .cmp(&a.total_spent)
                .then_with(|| a.category.cmp(&b.category))
        });
        summary.truncate(limit);

        Ok(summary)
    }

    fn spending_by_day(&self, range: &DateRange) -> Result<Vec<DailySpend>, Self::Error> {
        let mut totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for (date, _, amount) in self.amounts_in_range(range)? {
            let total = totals.entry(date).or_insert(Decimal::ZERO);
            *total = add_amount(*total, amount)?;
        }

        Ok(totals
            .into_iter()
            .map(|(transaction_date, total_spent)| DailySpend {
                transaction_date,
                total_spent,
            })
            .collect())
    }

    fn get_asset_by_key(&self, key: &AssetKey) -> Result<Option<Asset>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM assets
             WHERE institution_name = ?1 AND institution_type = ?2 AND asset_name = ?3",
            ASSET_COLUMNS
        );
        let asset = self
            .conn
            .query_row(
                &sql,
                params![
                    &key.institution_name,
                    key.institution_type.as_str(),
                    &key.asset_name
                ],
                Self::row_to_asset,
            )
            .optional()?;
        Ok(asset)
    }

    fn create_asset(&mut self, asset: &NewAsset) -> Result<AssetId, Self::Error> {
        let id = AssetId::new();
        let now = Utc::now();

        self.conn.execute(
            "INSERT INTO assets (id, created_at, institution_name, institution_type, asset_name,
                                 current_value, currency, last_updated, description, confirm)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &id.to_bytes()[..],
                now,
                &asset.key.institution_name,
                asset.key.institution_type.as_str(),
                &asset.key.asset_name,
                asset.value.current_value.to_string(),
                &asset.value.currency,
                now,
                &asset.description,
                asset.value.confirm,
            ],
        )?;

        debug!("Inserted asset {}", id);
        Ok(id)
    }

    fn update_asset_value(
        &mut self,
        id: AssetId,
        value: &AssetValue,
    ) -> Result<bool, Self::Error> {
        let changed = self.conn.execute(
            "UPDATE assets SET current_value = ?1, currency = ?2, confirm = ?3, last_updated = ?4
             WHERE id = ?5",
            params![
                value.current_value.to_string(),
                &value.currency,
                value.confirm,
                Utc::now(),
                &id.to_bytes()[..],
            ],
        )?;
        Ok(changed > 0)
    }

    fn append_asset_history(
        &mut self,
        id: AssetId,
        value: &AssetValue,
    ) -> Result<AssetHistoryEntry, Self::Error> {
        let value_date: DateTime<Utc> = Utc::now();

        self.conn.execute(
            "INSERT INTO asset_history (asset_id, value_date, value, currency)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                &id.to_bytes()[..],
                value_date,
                value.current_value.to_string(),
                &value.currency,
            ],
        )?;

        Ok(AssetHistoryEntry {
            id: self.conn.last_insert_rowid(),
            asset_id: id,
            value_date,
            value: value.current_value,
            currency: value.currency.clone(),
        })
    }

    fn get_asset(&self, id: AssetId) -> Result<Option<Asset>, Self::Error> {
        let sql = format!("SELECT {} FROM assets WHERE id = ?1", ASSET_COLUMNS);
        let asset = self
            .conn
            .query_row(&sql, params![&id.to_bytes()[..]], Self::row_to_asset)
            .optional()?;
        Ok(asset)
    }

    fn list_assets(&self, confirm: Option<bool>) -> Result<Vec<Asset>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM assets WHERE (?1 IS NULL OR confirm = ?1)
             ORDER BY institution_name, asset_name, institution_type",
            ASSET_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let assets = stmt
            .query_map(params![confirm], Self::row_to_asset)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(assets)
    }

    fn asset_history(&self, id: AssetId) -> Result<Vec<AssetHistoryEntry>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, asset_id, value_date, value, currency
             FROM asset_history WHERE asset_id = ?1 ORDER BY id ASC",
        )?;
        let history = stmt
            .query_map(params![&id.to_bytes()[..]], Self::row_to_history)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(history)
    }

    fn delete_asset(&mut self, id: AssetId) -> Result<bool, Self::Error> {
        let changed = self
            .conn
            .execute("DELETE FROM assets WHERE id = ?1", params![&id.to_bytes()[..]])?;
        Ok(changed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.initialize_schema().is_ok());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let store = SqliteStore::open_in_memory().unwrap();
        let enabled: i64 = store
            .conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_rollback_discards_insert() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tx = NewTransaction {
            transaction_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            amount: Decimal::new(10, 0),
            currency: "USD".to_string(),
            category: "food".to_string(),
            description: "snack".to_string(),
            confirm: false,
        };

        store.begin().unwrap();
        store.create_transaction(&tx).unwrap();
        store.rollback().unwrap();

        let all = store.list_transactions(&TransactionFilter::default()).unwrap();
        assert!(all.is_empty());
    }
}
