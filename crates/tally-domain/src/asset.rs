//! Financial assets and their value history

use crate::{AssetId, DomainError};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Currency applied when the extractor leaves it out
pub const DEFAULT_CURRENCY: &str = "USD";

/// Kind of institution holding an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstitutionType {
    /// Bank accounts, fixed deposits
    Bank,
    /// Stock brokers
    Broker,
    /// Mutual fund houses
    MutualFund,
    /// Anything else
    Other,
}

impl InstitutionType {
    /// All variants, in schema order
    pub const ALL: [InstitutionType; 4] = [
        InstitutionType::Bank,
        InstitutionType::Broker,
        InstitutionType::MutualFund,
        InstitutionType::Other,
    ];

    /// Wire and storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            InstitutionType::Bank => "bank",
            InstitutionType::Broker => "broker",
            InstitutionType::MutualFund => "mutual_fund",
            InstitutionType::Other => "other",
        }
    }
}

impl fmt::Display for InstitutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstitutionType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank" => Ok(InstitutionType::Bank),
            "broker" => Ok(InstitutionType::Broker),
            "mutual_fund" => Ok(InstitutionType::MutualFund),
            "other" => Ok(InstitutionType::Other),
            _ => Err(DomainError::InvalidInstitutionType(s.to_string())),
        }
    }
}

/// Logical key of an asset. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetKey {
    /// Institution name, e.g. "HDFC"
    pub institution_name: String,
    /// Institution kind
    pub institution_type: InstitutionType,
    /// Asset name without the institution, e.g. "Savings Account"
    pub asset_name: String,
}

/// An asset as extracted from free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAsset {
    /// Institution name
    pub institution_name: String,
    /// Institution kind
    pub institution_type: InstitutionType,
    /// Asset name, must not repeat the institution name
    pub asset_name: String,
    /// Value being reported
    pub current_value: Decimal,
    /// Currency code, empty when the extractor gave none
    #[serde(default)]
    pub currency: String,
    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Confirmation flag
    #[serde(default)]
    pub confirm: bool,
}

impl CandidateAsset {
    /// The reconciliation key of this candidate
    pub fn key(&self) -> AssetKey {
        AssetKey {
            institution_name: self.institution_name.clone(),
            institution_type: self.institution_type,
            asset_name: self.asset_name.clone(),
        }
    }

    /// Fill in [`DEFAULT_CURRENCY`] when the currency is blank
    pub fn with_default_currency(mut self) -> Self {
        if self.currency.trim().is_empty() {
            self.currency = DEFAULT_CURRENCY.to_string();
        }
        self
    }

    /// Drop a leading copy of the institution name from the asset name
    ///
    /// "HDFC Savings Account" at "HDFC" becomes "Savings Account". The prefix
    /// must match exactly and be followed by whitespace.
    pub fn with_separated_names(mut self) -> Self {
        let separated = self
            .asset_name
            .trim()
            .strip_prefix(self.institution_name.trim())
            .filter(|rest| rest.starts_with(char::is_whitespace) && !rest.trim().is_empty())
            .map(|rest| rest.trim().to_string());
        if let Some(asset_name) = separated {
            self.asset_name = asset_name;
        }
        self
    }

    /// True when the asset name is nothing but the institution name
    pub fn repeats_institution(&self) -> bool {
        self.asset_name.trim() == self.institution_name.trim()
    }

    /// Fields for inserting a brand new asset
    pub fn to_new_asset(&self) -> NewAsset {
        NewAsset {
            key: self.key(),
            value: self.value(),
            description: self.description.clone().unwrap_or_default(),
        }
    }

    /// The mutable value part of this candidate
    pub fn value(&self) -> AssetValue {
        AssetValue {
            current_value: self.current_value,
            currency: self.currency.clone(),
            confirm: self.confirm,
        }
    }
}

/// The value fields that change on every revaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetValue {
    /// New value
    pub current_value: Decimal,
    /// Currency of the value
    pub currency: String,
    /// Confirmation flag
    #[serde(default)]
    pub confirm: bool,
}

/// Fields for inserting an asset
#[derive(Debug, Clone, PartialEq)]
pub struct NewAsset {
    /// Logical key
    pub key: AssetKey,
    /// Initial value
    pub value: AssetValue,
    /// Description, empty when none was given
    pub description: String,
}

/// A persisted asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique identifier
    pub id: AssetId,
    /// When the asset was first recorded
    pub created_at: DateTime<Utc>,
    /// Institution name
    pub institution_name: String,
    /// Institution kind
    pub institution_type: InstitutionType,
    /// Asset name
    pub asset_name: String,
    /// Latest value
    pub current_value: Decimal,
    /// Currency of the latest value
    pub currency: String,
    /// Refreshed on every value change
    pub last_updated: DateTime<Utc>,
    /// Free-text description
    pub description: String,
    /// Confirmation flag
    pub confirm: bool,
}

impl Asset {
    /// The reconciliation key of this asset
    pub fn key(&self) -> AssetKey {
        AssetKey {
            institution_name: self.institution_name.clone(),
            institution_type: self.institution_type,
            asset_name: self.asset_name.clone(),
        }
    }
}

/// One immutable snapshot of an asset's value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetHistoryEntry {
    /// Row identifier, increasing with insertion order
    pub id: i64,
    /// Owning asset
    pub asset_id: AssetId,
    /// When the value was recorded
    pub value_date: DateTime<Utc>,
    /// Recorded value
    pub value: Decimal,
    /// Recorded currency
    pub currency: String,
}
