//! Integration tests for tally-store
//!
//! These tests verify the full CRUD cycle for transactions and assets and
//! the two spending summaries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tally_domain::traits::LedgerStore;
use tally_domain::{
    AssetKey, AssetValue, DateRange, InstitutionType, NewAsset, NewTransaction, TransactionFilter,
};
use tally_store::{SqliteStore, StoreError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn expense(on: NaiveDate, amount: Decimal, category: &str, confirm: bool) -> NewTransaction {
    NewTransaction {
        transaction_date: on,
        amount,
        currency: "USD".to_string(),
        category: category.to_string(),
        description: format!("{} expense", category),
        confirm,
    }
}

fn savings(name: &str, value: i64) -> NewAsset {
    NewAsset {
        key: AssetKey {
            institution_name: name.to_string(),
            institution_type: InstitutionType::Bank,
            asset_name: "Savings Account".to_string(),
        },
        value: AssetValue {
            current_value: Decimal::new(value, 0),
            currency: "USD".to_string(),
            confirm: false,
        },
        description: String::new(),
    }
}

#[test]
fn test_store_initialization() {
    let store = SqliteStore::open_in_memory();
    assert!(store.is_ok(), "Store should initialize successfully");
}

#[test]
fn test_create_and_get_transaction() {
    let mut store = SqliteStore::open_in_memory().unwrap();

    let created = store
        .create_transaction(&expense(date(2024, 3, 1), Decimal::new(1250, 2), "food", false))
        .unwrap();

    let fetched = store.get_transaction(created.id).unwrap().expect("transaction exists");
    assert_eq!(fetched, created);
    assert_eq!(fetched.amount, Decimal::new(1250, 2));
    assert_eq!(fetched.amount.to_string(), "12.50");
}

#[test]
fn test_update_transaction_replaces_all_fields() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let created = store
        .create_transaction(&expense(date(2024, 3, 1), Decimal::new(10, 0), "food", false))
        .unwrap();

    let replacement = expense(date(2024, 3, 2), Decimal::new(-5, 0), "refund", true);
    assert!(store.update_transaction(created.id, &replacement).unwrap());

    let fetched = store.get_transaction(created.id).unwrap().unwrap();
    assert_eq!(fetched.transaction_date, date(2024, 3, 2));
    assert_eq!(fetched.amount, Decimal::new(-5, 0));
    assert_eq!(fetched.category, "refund");
    assert!(fetched.confirm);
    assert_eq!(fetched.created_at, created.created_at);
}

#[test]
fn test_update_and_delete_unknown_transaction() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let missing = tally_domain::TransactionId::new();
    let tx = expense(date(2024, 3, 1), Decimal::ONE, "food", false);

    assert!(!store.update_transaction(missing, &tx).unwrap());
    assert!(!store.delete_transaction(missing).unwrap());
}

#[test]
fn test_delete_transaction_is_hard_delete() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let created = store
        .create_transaction(&expense(date(2024, 3, 1), Decimal::ONE, "food", false))
        .unwrap();

    assert!(store.delete_transaction(created.id).unwrap());
    assert!(store.get_transaction(created.id).unwrap().is_none());
    assert!(!store.delete_transaction(created.id).unwrap());
}

#[test]
fn test_list_transactions_with_filters() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.create_transaction(&expense(date(2024, 1, 5), Decimal::ONE, "food", true)).unwrap();
    store.create_transaction(&expense(date(2024, 1, 10), Decimal::ONE, "travel", false)).unwrap();
    store.create_transaction(&expense(date(2024, 1, 20), Decimal::ONE, "food", false)).unwrap();

    let all = store.list_transactions(&TransactionFilter::default()).unwrap();
    assert_eq!(all.len(), 3);
    // Newest first
    assert_eq!(all[0].transaction_date, date(2024, 1, 20));

    let unconfirmed = store
        .list_transactions(&TransactionFilter::new(Some(false), None, None).unwrap())
        .unwrap();
    assert_eq!(unconfirmed.len(), 2);
    assert!(unconfirmed.iter().all(|t| !t.confirm));

    let from_tenth = store
        .list_transactions(&TransactionFilter::new(None, Some(date(2024, 1, 10)), None).unwrap())
        .unwrap();
    assert_eq!(from_tenth.len(), 2);

    let window = store
        .list_transactions(
            &TransactionFilter::new(Some(false), Some(date(2024, 1, 1)), Some(date(2024, 1, 15)))
                .unwrap(),
        )
        .unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].category, "travel");
}

#[test]
fn test_spending_by_category() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let categories = ["food", "travel", "rent", "fun", "books", "gym"];
    for (i, category) in categories.iter().enumerate() {
        let amount = Decimal::new((i as i64 + 1) * 100, 2);
        store.create_transaction(&expense(date(2024, 2, 1), amount, category, false)).unwrap();
    }
    store
        .create_transaction(&expense(date(2024, 2, 2), Decimal::new(1010, 2), "food", false))
        .unwrap();
    // Outside the range
    store
        .create_transaction(&expense(date(2024, 3, 1), Decimal::new(99999, 0), "rent", false))
        .unwrap();

    let range = DateRange::new(date(2024, 2, 1), date(2024, 2, 29)).unwrap();
    let top = store.spending_by_category(&range, 5).unwrap();

    assert_eq!(top.len(), 5);
    assert_eq!(top[0].category, "food");
    assert_eq!(top[0].total_spent, Decimal::new(1110, 2));
    assert_eq!(top[1].category, "gym");
    assert_eq!(top[1].total_spent, Decimal::new(6, 0));
    assert!(top.iter().all(|c| c.category != "travel"));
}

#[test]
fn test_spending_by_day_is_exact_and_ordered() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    for _ in 0..3 {
        store
            .create_transaction(&expense(date(2024, 4, 2), Decimal::new(1, 1), "coffee", false))
            .unwrap();
    }
    store.create_transaction(&expense(date(2024, 4, 1), Decimal::new(5, 0), "food", false)).unwrap();

    let range = DateRange::new(date(2024, 4, 1), date(2024, 4, 30)).unwrap();
    let daily = store.spending_by_day(&range).unwrap();

    assert_eq!(daily.len(), 2);
    assert_eq!(daily[0].transaction_date, date(2024, 4, 1));
    assert_eq!(daily[1].transaction_date, date(2024, 4, 2));
    // 0.1 + 0.1 + 0.1 without float drift
    assert_eq!(daily[1].total_spent, Decimal::new(3, 1));
}

#[test]
fn test_report_overflow_is_an_error() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let huge = Decimal::MAX - Decimal::ONE;
    for _ in 0..2 {
        store.create_transaction(&expense(date(2024, 6, 1), huge, "food", false)).unwrap();
    }
    let range = DateRange::new(date(2024, 6, 1), date(2024, 6, 30)).unwrap();

    assert!(matches!(
        store.spending_by_category(&range, 5),
        Err(StoreError::InvalidData(_))
    ));
    assert!(matches!(
        store.spending_by_day(&range),
        Err(StoreError::InvalidData(_))
    ));

    // The store stays usable afterwards
    assert_eq!(store.list_transactions(&TransactionFilter::default()).unwrap().len(), 2);
}

#[test]
fn test_asset_lookup_by_exact_key() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let id = store.create_asset(&savings("HDFC", 5000)).unwrap();

    let found = store.get_asset_by_key(&savings("HDFC", 0).key).unwrap().unwrap();
    assert_eq!(found.id, id);
    assert_eq!(found.current_value, Decimal::new(5000, 0));

    assert!(store.get_asset_by_key(&savings("hdfc", 0).key).unwrap().is_none());
}

#[test]
fn test_asset_key_is_unique() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.create_asset(&savings("HDFC", 5000)).unwrap();
    assert!(store.create_asset(&savings("HDFC", 6000)).is_err());
}

#[test]
fn test_update_asset_value_and_history() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let id = store.create_asset(&savings("HDFC", 5000)).unwrap();
    let before = store.get_asset(id).unwrap().unwrap();

    let value = AssetValue {
        current_value: Decimal::new(5200, 0),
        currency: "INR".to_string(),
        confirm: true,
    };
    assert!(store.update_asset_value(id, &value).unwrap());
    let first = store.append_asset_history(id, &value).unwrap();
    let second = store.append_asset_history(id, &value).unwrap();
    assert!(first.id < second.id);

    let after = store.get_asset(id).unwrap().unwrap();
    assert_eq!(after.current_value, Decimal::new(5200, 0));
    assert_eq!(after.currency, "INR");
    assert!(after.confirm);
    assert!(after.last_updated >= before.last_updated);
    assert_eq!(after.created_at, before.created_at);

    let history = store.asset_history(id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, first.id);
    assert_eq!(history[1].value, Decimal::new(5200, 0));
}

#[test]
fn test_update_unknown_asset() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let value = AssetValue {
        current_value: Decimal::ONE,
        currency: "USD".to_string(),
        confirm: false,
    };
    assert!(!store.update_asset_value(tally_domain::AssetId::new(), &value).unwrap());
}

#[test]
fn test_history_requires_existing_asset() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let value = AssetValue {
        current_value: Decimal::ONE,
        currency: "USD".to_string(),
        confirm: false,
    };
    assert!(store.append_asset_history(tally_domain::AssetId::new(), &value).is_err());
}

#[test]
fn test_delete_asset_cascades_history() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    let new_asset = savings("HDFC", 5000);
    let id = store.create_asset(&new_asset).unwrap();
    store.append_asset_history(id, &new_asset.value).unwrap();

    assert!(store.delete_asset(id).unwrap());
    assert!(store.get_asset(id).unwrap().is_none());
    assert!(store.asset_history(id).unwrap().is_empty());
}

#[test]
fn test_list_assets_by_confirmation() {
    let mut store = SqliteStore::open_in_memory().unwrap();
    store.create_asset(&savings("Citibank", 1)).unwrap();
    let mut confirmed = savings("HDFC", 2);
    confirmed.value.confirm = true;
    store.create_asset(&confirmed).unwrap();

    assert_eq!(store.list_assets(None).unwrap().len(), 2);
    let only_confirmed = store.list_assets(Some(true)).unwrap();
    assert_eq!(only_confirmed.len(), 1);
    assert_eq!(only_confirmed[0].institution_name, "HDFC");
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tally.db");

    let id = {
        let mut store = SqliteStore::new(&path).unwrap();
        store.create_asset(&savings("HDFC", 5000)).unwrap()
    };

    let store = SqliteStore::new(&path).unwrap();
    let asset = store.get_asset(id).unwrap().expect("asset persisted");
    assert_eq!(asset.institution_name, "HDFC");
}
