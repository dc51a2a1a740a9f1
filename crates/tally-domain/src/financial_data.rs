//! The result of one extraction

use crate::{CandidateAsset, CandidateTransaction};
use serde::{Deserialize, Serialize};

/// Candidate transactions and assets extracted from one piece of text
///
/// Either list may be empty, but an extraction where both are empty is a
/// failure; see [`FinancialData::is_empty`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    /// Expenses, in the order the model listed them
    #[serde(default)]
    pub transactions: Vec<CandidateTransaction>,

    /// Assets, in the order the model listed them
    #[serde(default)]
    pub assets: Vec<CandidateAsset>,
}

impl FinancialData {
    /// True when nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty() && self.assets.is_empty()
    }
}
