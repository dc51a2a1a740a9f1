//! Expense transactions: extracted candidates and persisted records

use crate::{DomainError, TransactionId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Calendar date format used everywhere dates cross a boundary
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` date
///
/// Single-digit months or days, surrounding whitespace and signed years
/// are rejected even where chrono alone would accept them.
///
/// # Examples
///
/// ```
/// use tally_domain::parse_date;
///
/// assert!(parse_date("2024-09-01").is_ok());
/// assert!(parse_date("2024-9-1").is_err());
/// assert!(parse_date("2024-02-30").is_err());
/// ```
pub fn parse_date(value: &str) -> Result<NaiveDate, DomainError> {
    let invalid = || DomainError::InvalidDate {
        value: value.to_string(),
    };

    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid())
}

/// A transaction as extracted from free text, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTransaction {
    /// Date as produced by the extractor; validated by the ingestor
    pub transaction_date: String,

    /// Signed amount in `currency`
    pub amount: Decimal,

    /// Currency code
    #[serde(default)]
    pub currency: String,

    /// One-word category (e.g. food, travel)
    pub category: String,

    /// Short free-text description
    pub description: String,

    /// `false` means the record still needs user confirmation
    #[serde(default)]
    pub confirm: bool,
}

impl CandidateTransaction {
    /// Validate the candidate into a record ready for insertion
    pub fn validate(&self) -> Result<NewTransaction, DomainError> {
        Ok(NewTransaction {
            transaction_date: parse_date(&self.transaction_date)?,
            amount: self.amount,
            currency: self.currency.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            confirm: self.confirm,
        })
    }
}

/// Validated transaction fields, used for inserts and full-replace updates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    /// Calendar date of the transaction
    pub transaction_date: NaiveDate,
    /// Signed amount
    pub amount: Decimal,
    /// Currency code
    pub currency: String,
    /// One-word category
    pub category: String,
    /// Free-text description
    pub description: String,
    /// Confirmation flag
    pub confirm: bool,
}

/// A persisted transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,
    /// When the record was written
    pub created_at: DateTime<Utc>,
    /// Calendar date of the transaction
    pub transaction_date: NaiveDate,
    /// Signed amount
    pub amount: Decimal,
    /// Currency code
    pub currency: String,
    /// One-word category
    pub category: String,
    /// Free-text description
    pub description: String,
    /// Confirmation flag
    pub confirm: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(date: &str) -> CandidateTransaction {
        CandidateTransaction {
            transaction_date: date.to_string(),
            amount: Decimal::new(1250, 2),
            currency: "USD".to_string(),
            category: "food".to_string(),
            description: "lunch".to_string(),
            confirm: false,
        }
    }

    #[test]
    fn test_parse_date_strict() {
        assert_eq!(
            parse_date("2021-09-01").unwrap(),
            NaiveDate::from_ymd_opt(2021, 9, 1).unwrap()
        );
        assert!(parse_date("2021-9-01").is_err());
        assert!(parse_date(" 2021-09-01").is_err());
        assert!(parse_date("2021/09/01").is_err());
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("2021-13-01").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_validate_keeps_fields() {
        let tx = candidate("2024-03-15").validate().unwrap();
        assert_eq!(tx.transaction_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(tx.amount, Decimal::new(125, 1));
        assert_eq!(tx.category, "food");
        assert!(!tx.confirm);
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let err = candidate("15/03/2024").validate().unwrap_err();
        assert_eq!(
            err,
            DomainError::InvalidDate {
                value: "15/03/2024".to_string()
            }
        );
    }

    #[test]
    fn test_candidate_from_model_json() {
        let json = r#"{
            "transaction_date": "2024-03-15",
            "amount": 12.5,
            "category": "food",
            "description": "Lunch"
        }"#;
        let tx: CandidateTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.amount, Decimal::new(125, 1));
        assert_eq!(tx.currency, "");
        assert!(!tx.confirm);
    }
}
