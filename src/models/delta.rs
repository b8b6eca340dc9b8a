//! Asset list delta - per-account added/removed asset ids

use super::{AccountId, AssetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Added/removed asset ids for one account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountAssetChange {
    #[serde(default)]
    pub added: Vec<AssetId>,
    #[serde(default)]
    pub removed: Vec<AssetId>,
}

impl AccountAssetChange {
    pub fn added(ids: Vec<AssetId>) -> Self {
        Self {
            added: ids,
            removed: Vec::new(),
        }
    }

    pub fn removed(ids: Vec<AssetId>) -> Self {
        Self {
            added: Vec::new(),
            removed: ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Asset list delta keyed by account id
///
/// A `BTreeMap` keeps per-account processing order deterministic.
pub type AssetListDelta = BTreeMap<AccountId, AccountAssetChange>;
