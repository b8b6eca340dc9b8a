//! AssetCacheManager - keeps per-account asset lists and the metadata cache in sync
//!
//! Inputs:
//! - Account lifecycle (added/removed)
//! - Asset list deltas pushed by account modules
//! - User actions (ignore, curated add)
//!
//! Outputs on the event bus:
//! - `AssetListChanged` with the effective per-account delta
//! - `AssetsStateChanged` snapshots

use super::state::{ensure_single_namespace, AssetsState};
use super::KnownAssets;
use crate::clients::{AccountRegistry, CapabilityResolver, ModuleAssetGateway};
use crate::error::AppResult;
use crate::events::{EventBus, SyncEvent};
use crate::models::{
    Account, AccountAssetChange, AccountId, AssetId, AssetListDelta, AssetMetadata,
    AssetMetadataMap, ModuleId,
};
use crate::token::TokenScreener;
use futures_util::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;

/// Which assets still need metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MetadataScope {
    /// Assets whose namespace has no cached metadata at all
    MissingNamespaces,
    /// Assets with no cached metadata entry
    MissingAssets,
}

/// Owner of the known/ignored asset sets and the metadata cache
pub struct AssetCacheManager {
    state: RwLock<AssetsState>,
    gateway: Arc<dyn ModuleAssetGateway>,
    capabilities: Arc<dyn CapabilityResolver>,
    registry: Arc<dyn AccountRegistry>,
    screener: TokenScreener,
    bus: EventBus,
}

impl AssetCacheManager {
    pub fn new(
        gateway: Arc<dyn ModuleAssetGateway>,
        capabilities: Arc<dyn CapabilityResolver>,
        registry: Arc<dyn AccountRegistry>,
        screener: TokenScreener,
        bus: EventBus,
    ) -> Self {
        Self {
            state: RwLock::new(AssetsState::default()),
            gateway,
            capabilities,
            registry,
            screener,
            bus,
        }
    }

    /// Start from a previously persisted snapshot
    pub fn with_state(self, state: AssetsState) -> Self {
        *self.state.write() = state;
        self
    }

    /// Snapshot of the whole cache
    pub fn state(&self) -> AssetsState {
        self.state.read().clone()
    }

    pub fn ignored_assets(&self, account_id: &str) -> Vec<AssetId> {
        self.state.read().ignored(account_id).to_vec()
    }

    /// Cached metadata for an asset, `None` when unknown
    pub fn get_asset_metadata(&self, asset_id: &AssetId) -> Option<AssetMetadata> {
        self.state.read().metadata(asset_id).cloned()
    }

    /// Initial population for a module-backed account
    pub async fn on_account_added(&self, account: &Account) {
        let Some(module_id) = account.sync_module() else {
            tracing::debug!(account_id = %account.id, "Account has no module, skipping asset sync");
            return;
        };

        let assets = match self.gateway.resolve_assets(module_id, &account.id).await {
            Ok(assets) => assets,
            Err(e) => {
                tracing::warn!(
                    account_id = %account.id,
                    module_id = module_id,
                    error = %e,
                    "Failed to resolve account assets"
                );
                return;
            }
        };

        let assets = self.screener.filter_malicious(assets).await;

        if self.registry.get_account(&account.id).await.is_none() {
            tracing::debug!(account_id = %account.id, "Account removed while resolving assets");
            return;
        }

        // Merge rather than overwrite: a delta may have bootstrapped the account meanwhile
        let stored = {
            let mut state = self.state.write();
            state.apply_asset_change(&account.id, &[], assets);
            state.known_assets(&account.id).to_vec()
        };

        tracing::info!(
            account_id = %account.id,
            asset_count = stored.len(),
            "Account assets initialised"
        );

        self.refresh_metadata(module_id, &stored, MetadataScope::MissingNamespaces)
            .await;
        self.publish_state();
    }

    /// Drop both asset sets of an account
    pub fn on_account_removed(&self, account_id: &str) {
        let removed = self.state.write().remove_account(account_id);
        if removed {
            tracing::debug!(account_id = account_id, "Account assets removed");
            self.publish_state();
        }
    }

    /// Reconcile a module-pushed asset list delta
    pub async fn on_account_asset_list_updated(&self, delta: &AssetListDelta) {
        let pending: Vec<(&AccountId, &AccountAssetChange, Vec<AssetId>)> = {
            let state = self.state.read();
            delta
                .iter()
                .map(|(account_id, change)| {
                    let candidates =
                        state.new_candidates(account_id, &change.added, &change.removed);
                    (account_id, change, candidates)
                })
                .collect()
        };

        let screened = join_all(pending.into_iter().map(|(account_id, change, candidates)| {
            async move {
                let survivors = self.screener.filter_malicious(candidates).await;
                (account_id, change, survivors)
            }
        }))
        .await;

        let effective: AssetListDelta = {
            let mut state = self.state.write();
            screened
                .into_iter()
                .map(|(account_id, change, survivors)| {
                    let applied = state.apply_asset_change(account_id, &change.removed, survivors);
                    (account_id.clone(), applied)
                })
                .filter(|(_, applied)| !applied.is_empty())
                .collect()
        };

        if effective.is_empty() {
            tracing::debug!(accounts = delta.len(), "Asset list update had no effect");
            return;
        }

        self.refresh_added_metadata(&effective).await;

        tracing::info!(accounts = effective.len(), "Account asset lists updated");
        self.emit_delta(effective);
        self.publish_state();
    }

    /// Hide assets for an account
    pub fn ignore_assets(&self, asset_ids: &[AssetId], account_id: &str) {
        let outcome = self.state.write().ignore_assets(account_id, asset_ids);
        if outcome.is_noop() {
            return;
        }

        if !outcome.removed.is_empty() {
            let delta = AssetListDelta::from([(
                account_id.to_string(),
                AccountAssetChange::removed(outcome.removed),
            )]);
            self.emit_delta(delta);
        }
        self.publish_state();
    }

    /// Add assets from a curated list (not screened), un-ignoring them.
    ///
    /// Returns the full known asset list of the account.
    pub fn add_assets(&self, asset_ids: &[AssetId], account_id: &str) -> AppResult<Vec<AssetId>> {
        ensure_single_namespace(asset_ids).inspect_err(|e| {
            tracing::warn!(
                account_id = account_id,
                reason = e.reason(),
                error = %e,
                "Rejected curated assets"
            )
        })?;

        let (added, known) = {
            let mut state = self.state.write();
            let added = state.add_assets(account_id, asset_ids);
            (added, state.known_assets(account_id).to_vec())
        };

        if added.is_empty() {
            return Ok(known);
        }

        tracing::debug!(
            account_id = account_id,
            added = added.len(),
            "Curated assets added"
        );
        let delta = AssetListDelta::from([(account_id.to_string(), AccountAssetChange::added(added))]);
        self.emit_delta(delta);
        self.publish_state();

        Ok(known)
    }

    /// Fetch metadata for every newly added asset, routed through each account's module
    async fn refresh_added_metadata(&self, effective: &AssetListDelta) {
        let mut by_module: Vec<(ModuleId, Vec<AssetId>)> = Vec::new();
        for (account_id, change) in effective.iter().filter(|(_, c)| !c.added.is_empty()) {
            let Some(module_id) = self
                .registry
                .get_account(account_id)
                .await
                .and_then(|account| account.sync_module().map(str::to_string))
            else {
                tracing::debug!(account_id = %account_id, "No module for account, skipping metadata");
                continue;
            };

            let index = match by_module.iter().position(|(m, _)| *m == module_id) {
                Some(index) => index,
                None => {
                    by_module.push((module_id, Vec::new()));
                    by_module.len() - 1
                }
            };
            let assets = &mut by_module[index].1;
            for asset in &change.added {
                if !assets.contains(asset) {
                    assets.push(asset.clone());
                }
            }
        }

        join_all(by_module.iter().map(|(module_id, assets)| {
            self.refresh_metadata(module_id, assets, MetadataScope::MissingAssets)
        }))
        .await;
    }

    /// Fetch and merge metadata for `assets` from `module_id`, one request per
    /// authorized namespace. A failed namespace never blocks the others.
    async fn refresh_metadata(&self, module_id: &str, assets: &[AssetId], scope: MetadataScope) {
        let missing: Vec<&AssetId> = {
            let state = self.state.read();
            assets
                .iter()
                .filter(|asset| match scope {
                    MetadataScope::MissingNamespaces => {
                        !state.has_namespace_metadata(asset.namespace())
                    }
                    MetadataScope::MissingAssets => state.metadata(asset).is_none(),
                })
                .collect()
        };

        if missing.is_empty() {
            return;
        }

        let authorized = self
            .capabilities
            .authorized_namespaces(module_id)
            .await
            .unwrap_or_default();

        let mut by_namespace: Vec<(&str, Vec<AssetId>)> = Vec::new();
        for asset in missing {
            let namespace = asset.namespace();
            if !authorized.iter().any(|ns| ns == namespace) {
                tracing::debug!(
                    module_id = module_id,
                    namespace = namespace,
                    "Module not authorized for namespace, skipping metadata"
                );
                continue;
            }
            match by_namespace.iter_mut().find(|(ns, _)| *ns == namespace) {
                Some((_, ids)) => ids.push(asset.clone()),
                None => by_namespace.push((namespace, vec![asset.clone()])),
            }
        }

        let settled = join_all(by_namespace.iter().map(|(namespace, ids)| async move {
            let result = self.gateway.resolve_metadata(module_id, namespace, ids).await;
            (*namespace, result)
        }))
        .await;

        let mut fetched = AssetMetadataMap::new();
        for (namespace, result) in settled {
            match result {
                Ok(metadata) => fetched.extend(metadata),
                Err(e) => tracing::warn!(
                    module_id = module_id,
                    namespace = namespace,
                    error = %e,
                    "Failed to fetch asset metadata"
                ),
            }
        }

        if !fetched.is_empty() {
            tracing::trace!(entries = fetched.len(), "Merging asset metadata");
            self.state.write().merge_metadata(fetched);
        }
    }

    /// Hand the effective delta to the dispatcher and to subscribers
    fn emit_delta(&self, delta: AssetListDelta) {
        self.bus.enqueue(SyncEvent::AssetListChanged(delta.clone()));
        self.bus.publish(SyncEvent::AssetListChanged(delta));
    }

    fn publish_state(&self) {
        self.bus
            .publish(SyncEvent::AssetsStateChanged(self.state.read().clone()));
    }
}

impl KnownAssets for AssetCacheManager {
    fn known_assets(&self, account_id: &str) -> Vec<AssetId> {
        self.state.read().known_assets(account_id).to_vec()
    }
}

