//! Query filters and spending summaries

use crate::DomainError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An inclusive calendar date range with `start <= end`
///
/// The only way to build one is [`DateRange::new`], so an inverted range
/// never reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting `start > end`
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use tally_domain::DateRange;
    ///
    /// let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    /// assert!(DateRange::new(jan, feb).is_ok());
    /// assert!(DateRange::new(feb, jan).is_err());
    /// ```
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// First day of the range
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the range (inclusive)
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether `date` falls inside the range
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Optional constraints for listing transactions
///
/// Each field is independently absent or present; an absent field places no
/// constraint on the result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    /// Only transactions with this confirmation flag
    pub confirm: Option<bool>,
    /// Only transactions on or after this date
    pub start_date: Option<NaiveDate>,
    /// Only transactions on or before this date
    pub end_date: Option<NaiveDate>,
}

impl TransactionFilter {
    /// Build a filter, validating the range when both bounds are present
    pub fn new(
        confirm: Option<bool>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, DomainError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            DateRange::new(start, end)?;
        }
        Ok(Self {
            confirm,
            start_date,
            end_date,
        })
    }
}

/// Total spent in one category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    /// Category name
    pub category: String,
    /// Sum of amounts
    pub total_spent: Decimal,
}

/// Total spent on one day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpend {
    /// Calendar day
    pub transaction_date: NaiveDate,
    /// Sum of amounts
    pub total_spent: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(day(3), day(3)).unwrap();
        assert!(range.contains(day(3)));
        assert!(!range.contains(day(4)));
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert_eq!(
            DateRange::new(day(10), day(1)).unwrap_err(),
            DomainError::InvalidDateRange {
                start: day(10),
                end: day(1)
            }
        );
    }

    #[test]
    fn test_filter_with_open_bounds() {
        assert!(TransactionFilter::new(None, Some(day(10)), None).is_ok());
        assert!(TransactionFilter::new(Some(true), None, Some(day(1))).is_ok());
        assert!(TransactionFilter::new(None, Some(day(10)), Some(day(1))).is_err());
    }
}
