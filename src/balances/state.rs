//! Balance cache state and its reducers

use crate::models::{AccountId, AssetBalances, AssetId, BalancePush};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted shape of the balance cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancesState {
    /// Account id -> asset id -> balance
    #[serde(default)]
    pub balances: BTreeMap<AccountId, AssetBalances>,
}

impl BalancesState {
    pub fn balances_for(&self, account_id: &str) -> Option<&AssetBalances> {
        self.balances.get(account_id)
    }

    /// Replace an account's record wholesale
    pub fn replace_account(&mut self, account_id: &str, balances: AssetBalances) {
        self.balances.insert(account_id.to_string(), balances);
    }

    pub fn remove_account(&mut self, account_id: &str) -> bool {
        self.balances.remove(account_id).is_some()
    }

    /// Merge a bulk push into accounts already tracked, overwriting per asset.
    /// Untracked accounts are skipped. Returns whether anything was written.
    pub fn merge_push(&mut self, push: &BalancePush) -> bool {
        let mut changed = false;
        for (account_id, pushed) in push {
            if let Some(record) = self.balances.get_mut(account_id) {
                for (asset_id, balance) in pushed {
                    record.insert(asset_id.clone(), balance.clone());
                    changed = true;
                }
            }
        }
        changed
    }

    /// Merge an incremental fetch. An absent or empty record takes the fetch
    /// as-is; otherwise only assets missing from the record are inserted.
    pub fn merge_missing(&mut self, account_id: &str, fetched: AssetBalances) -> bool {
        match self.balances.get_mut(account_id) {
            Some(record) if !record.is_empty() => {
                let mut changed = false;
                for (asset_id, balance) in fetched {
                    if !record.contains_key(&asset_id) {
                        record.insert(asset_id, balance);
                        changed = true;
                    }
                }
                changed
            }
            _ => {
                self.balances.insert(account_id.to_string(), fetched);
                true
            }
        }
    }

    /// Drop balances of assets no longer known for the account
    pub fn prune(&mut self, account_id: &str, removed: &[AssetId]) -> bool {
        let Some(record) = self.balances.get_mut(account_id) else {
            return false;
        };
        let before = record.len();
        record.retain(|asset_id, _| !removed.contains(asset_id));
        record.len() != before
    }
}
