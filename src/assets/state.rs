//! Asset cache state and its reducers
//!
//! All mutation goes through methods that return the effective change, so
//! the manager can decide what to emit without re-diffing.

use crate::error::{AppError, AppResult};
use crate::models::{AccountAssetChange, AccountId, AssetId, AssetMetadata, AssetMetadataMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// What `AssetsState::ignore_assets` changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreOutcome {
    /// Ids that left the known set
    pub removed: Vec<AssetId>,
    /// Ids newly added to the ignored set
    pub newly_ignored: Vec<AssetId>,
}

impl IgnoreOutcome {
    pub fn is_noop(&self) -> bool {
        self.removed.is_empty() && self.newly_ignored.is_empty()
    }
}

/// Persisted shape of the asset cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetsState {
    /// Account id -> known assets, in display order
    #[serde(default, rename = "accountsAssets")]
    pub accounts_assets: BTreeMap<AccountId, Vec<AssetId>>,
    /// Account id -> assets hidden by the user
    #[serde(default, rename = "ignoredAssets")]
    pub ignored_assets: BTreeMap<AccountId, Vec<AssetId>>,
    /// Asset id -> metadata (never pruned here)
    #[serde(default, rename = "assetsMetadata")]
    pub assets_metadata: AssetMetadataMap,
}

impl AssetsState {
    /// Known assets for an account (empty if untracked)
    pub fn known_assets(&self, account_id: &str) -> &[AssetId] {
        self.accounts_assets
            .get(account_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ignored assets for an account (empty if none)
    pub fn ignored(&self, account_id: &str) -> &[AssetId] {
        self.ignored_assets
            .get(account_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_tracked(&self, account_id: &str) -> bool {
        self.accounts_assets.contains_key(account_id)
    }

    fn is_ignored(&self, account_id: &str, asset: &AssetId) -> bool {
        self.ignored(account_id).contains(asset)
    }

    /// Drop both asset sets of an account; returns whether anything existed
    pub fn remove_account(&mut self, account_id: &str) -> bool {
        let known = self.accounts_assets.remove(account_id).is_some();
        let ignored = self.ignored_assets.remove(account_id).is_some();
        known || ignored
    }

    /// Ids from `added` that would be new once `removed` is applied:
    /// not known, not ignored, first occurrence only.
    pub fn new_candidates(
        &self,
        account_id: &str,
        added: &[AssetId],
        removed: &[AssetId],
    ) -> Vec<AssetId> {
        let known = self.known_assets(account_id);
        let mut seen = HashSet::new();
        added
            .iter()
            .filter(|&asset| {
                let still_known = known.contains(asset) && !removed.contains(asset);
                !still_known && !self.is_ignored(account_id, asset) && seen.insert(asset)
            })
            .cloned()
            .collect()
    }

    /// Apply a screened delta to one account.
    ///
    /// Removals first, then survivors are appended in order. Survivors are
    /// re-checked against the current sets since state may have moved on
    /// while screening was in flight. An untracked account is bootstrapped.
    pub fn apply_asset_change(
        &mut self,
        account_id: &str,
        removed: &[AssetId],
        survivors: Vec<AssetId>,
    ) -> AccountAssetChange {
        let ignored: HashSet<AssetId> = self.ignored(account_id).iter().cloned().collect();
        let known = self
            .accounts_assets
            .entry(account_id.to_string())
            .or_default();

        let mut effective = AccountAssetChange::default();
        for asset in removed {
            if let Some(pos) = known.iter().position(|a| a == asset) {
                effective.removed.push(known.remove(pos));
            }
        }

        for asset in survivors {
            if !ignored.contains(&asset) && !known.contains(&asset) {
                known.push(asset.clone());
                effective.added.push(asset);
            }
        }

        effective
    }

    /// Hide assets for an account
    pub fn ignore_assets(&mut self, account_id: &str, asset_ids: &[AssetId]) -> IgnoreOutcome {
        let mut outcome = IgnoreOutcome::default();
        if let Some(known) = self.accounts_assets.get_mut(account_id) {
            known.retain(|asset| {
                if asset_ids.contains(asset) {
                    outcome.removed.push(asset.clone());
                    false
                } else {
                    true
                }
            });
        }

        for asset in asset_ids {
            let ignored = self
                .ignored_assets
                .entry(account_id.to_string())
                .or_default();
            if !ignored.contains(asset) {
                ignored.push(asset.clone());
                outcome.newly_ignored.push(asset.clone());
            }
        }

        outcome
    }

    /// Add curated assets; returns the ids that were newly added to the known set.
    /// Supplied ids are always removed from the ignored set.
    pub fn add_assets(&mut self, account_id: &str, asset_ids: &[AssetId]) -> Vec<AssetId> {
        if asset_ids.is_empty() {
            return Vec::new();
        }

        if let Some(ignored) = self.ignored_assets.get_mut(account_id) {
            ignored.retain(|asset| !asset_ids.contains(asset));
            if ignored.is_empty() {
                self.ignored_assets.remove(account_id);
            }
        }

        let known = self
            .accounts_assets
            .entry(account_id.to_string())
            .or_default();
        let mut added = Vec::new();
        for asset in asset_ids {
            if !known.contains(asset) {
                known.push(asset.clone());
                added.push(asset.clone());
            }
        }

        added
    }

    pub fn metadata(&self, asset_id: &AssetId) -> Option<&AssetMetadata> {
        self.assets_metadata.get(asset_id)
    }

    /// Whether any cached metadata entry belongs to `namespace`
    pub fn has_namespace_metadata(&self, namespace: &str) -> bool {
        self.assets_metadata
            .keys()
            .any(|asset| asset.namespace() == namespace)
    }

    /// Merge fetched metadata, fresher entries overwrite older ones
    pub fn merge_metadata(&mut self, metadata: AssetMetadataMap) {
        self.assets_metadata.extend(metadata);
    }
}

/// Require every id to share one chain namespace
pub fn ensure_single_namespace(asset_ids: &[AssetId]) -> AppResult<()> {
    let mut namespaces: Vec<&str> = Vec::new();
    for asset in asset_ids {
        if !namespaces.contains(&asset.namespace()) {
            namespaces.push(asset.namespace());
        }
    }

    if namespaces.len() > 1 {
        return Err(AppError::Validation(format!(
            "All assets must belong to the same chain. Found assets from the following chains: {}",
            namespaces.join(", ")
        )));
    }

    Ok(())
}
