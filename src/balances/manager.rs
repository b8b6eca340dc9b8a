//! BalanceCacheManager - per-account, per-asset balance cache
//!
//! Balances are fetched through the account's module:
//! - wholesale refresh (`update_balance` / `update_balances`), priced over the known asset set
//! - incremental fetch for assets reported by the asset cache's delta
//! - bulk pushes merged into accounts already tracked
//!
//! Every fetch is gated on the wallet being unlocked. Failures are logged
//! and leave the previous record untouched.

use super::state::BalancesState;
use crate::assets::KnownAssets;
use crate::clients::{AccountRegistry, ModuleAssetGateway, SessionState};
use crate::events::{EventBus, SyncEvent};
use crate::models::{Account, AccountId, AssetBalances, AssetListDelta, BalancePush};
use futures_util::future::join_all;
use parking_lot::RwLock;
use std::sync::Arc;

/// Owner of the balance cache
pub struct BalanceCacheManager {
    state: RwLock<BalancesState>,
    gateway: Arc<dyn ModuleAssetGateway>,
    registry: Arc<dyn AccountRegistry>,
    assets: Arc<dyn KnownAssets>,
    session: Arc<dyn SessionState>,
    bus: EventBus,
}

impl BalanceCacheManager {
    pub fn new(
        gateway: Arc<dyn ModuleAssetGateway>,
        registry: Arc<dyn AccountRegistry>,
        assets: Arc<dyn KnownAssets>,
        session: Arc<dyn SessionState>,
        bus: EventBus,
    ) -> Self {
        Self {
            state: RwLock::new(BalancesState::default()),
            gateway,
            registry,
            assets,
            session,
            bus,
        }
    }

    /// Start from a previously persisted snapshot
    pub fn with_state(self, state: BalancesState) -> Self {
        *self.state.write() = state;
        self
    }

    pub fn state(&self) -> BalancesState {
        self.state.read().clone()
    }

    pub fn balances_for(&self, account_id: &str) -> Option<AssetBalances> {
        self.state.read().balances_for(account_id).cloned()
    }

    /// Refresh every module-backed account.
    ///
    /// Errors are logged per account and never returned, so callers cannot
    /// tell "no data" apart from "failed".
    pub async fn update_balances(&self) {
        if !self.session.is_unlocked() {
            tracing::debug!("Wallet locked, skipping balance refresh");
            return;
        }

        let accounts = self.registry.list_accounts().await;
        let settled = join_all(
            accounts
                .iter()
                .filter(|account| account.sync_module().is_some())
                .map(|account| async move { (account, self.fetch_known_balances(account).await) }),
        )
        .await;

        let current = self.registry.list_accounts().await;
        let mut changed = false;
        {
            let mut state = self.state.write();
            for (account, fetched) in settled {
                let Some(balances) = fetched else { continue };
                if !current.iter().any(|a| a.id == account.id) {
                    continue;
                }
                state.replace_account(&account.id, balances);
                changed = true;
            }
        }

        if changed {
            self.publish_state();
        }
    }

    /// Refresh one account; errors are logged, not returned
    pub async fn update_balance(&self, account_id: &str) {
        if !self.session.is_unlocked() {
            tracing::debug!(account_id = account_id, "Wallet locked, skipping balance refresh");
            return;
        }

        let Some(account) = self.registry.get_account(account_id).await else {
            tracing::warn!(account_id = account_id, "Cannot refresh balances of unknown account");
            return;
        };

        let Some(balances) = self.fetch_known_balances(&account).await else {
            return;
        };

        if self.registry.get_account(account_id).await.is_none() {
            tracing::debug!(account_id = account_id, "Account removed while fetching balances");
            return;
        }

        self.state.write().replace_account(account_id, balances);
        self.publish_state();
    }

    /// Initial balances for a freshly added module account
    pub async fn on_account_added(&self, account: &Account) {
        if account.sync_module().is_some() {
            self.update_balance(&account.id).await;
        }
    }

    pub fn on_account_removed(&self, account_id: &str) {
        if self.state.write().remove_account(account_id) {
            tracing::debug!(account_id = account_id, "Account balances removed");
            self.publish_state();
        }
    }

    /// Merge a module push into accounts already tracked
    pub fn on_account_balances_updated(&self, push: &BalancePush) {
        if self.state.write().merge_push(push) {
            self.publish_state();
        }
    }

    /// Incremental update from the asset cache's effective delta
    pub async fn on_asset_list_changed(&self, delta: &AssetListDelta) {
        if !self.session.is_unlocked() {
            tracing::debug!(accounts = delta.len(), "Wallet locked, ignoring asset list change");
            return;
        }

        let mut requests: Vec<(&AccountId, String)> = Vec::new();
        for (account_id, change) in delta.iter().filter(|(_, c)| !c.added.is_empty()) {
            match self
                .registry
                .get_account(account_id)
                .await
                .and_then(|account| account.sync_module().map(str::to_string))
            {
                Some(module_id) => requests.push((account_id, module_id)),
                None => {
                    tracing::debug!(account_id = %account_id, "No module for account, skipping balances")
                }
            }
        }

        let settled = join_all(requests.iter().map(|(account_id, module_id)| async move {
            let added = &delta[*account_id].added;
            let result = self.gateway.resolve_balances(module_id, account_id, added).await;
            (*account_id, module_id.as_str(), result)
        }))
        .await;

        let mut changed = false;
        {
            let mut state = self.state.write();
            for (account_id, change) in delta.iter().filter(|(_, c)| !c.removed.is_empty()) {
                changed |= state.prune(account_id, &change.removed);
            }

            for (account_id, module_id, result) in settled {
                match result {
                    Ok(fetched) => changed |= state.merge_missing(account_id, fetched),
                    Err(e) => tracing::warn!(
                        account_id = %account_id,
                        module_id = module_id,
                        error = %e,
                        "Failed to fetch balances for new assets"
                    ),
                }
            }
        }

        if changed {
            self.publish_state();
        }
    }

    /// Fetch balances for the account's whole known asset set
    async fn fetch_known_balances(&self, account: &Account) -> Option<AssetBalances> {
        let module_id = account.sync_module()?;
        let asset_ids = self.assets.known_assets(&account.id);

        match self
            .gateway
            .resolve_balances(module_id, &account.id, &asset_ids)
            .await
        {
            Ok(balances) => Some(balances),
            Err(e) => {
                tracing::warn!(
                    account_id = %account.id,
                    module_id = module_id,
                    error = %e,
                    "Failed to fetch balances"
                );
                None
            }
        }
    }

    fn publish_state(&self) {
        self.bus
            .publish(SyncEvent::BalancesStateChanged(self.state.read().clone()));
    }
}
