//! Balance models

use super::{AccountId, AssetId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Balance of one asset, amount kept as the decimal string the module returned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: String,
    pub unit: String,
}

impl Balance {
    pub fn new(amount: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            unit: unit.into(),
        }
    }
}

/// Balances of one account: asset id -> balance
pub type AssetBalances = HashMap<AssetId, Balance>;

/// Bulk balance push payload: account id -> balances
pub type BalancePush = HashMap<AccountId, AssetBalances>;
