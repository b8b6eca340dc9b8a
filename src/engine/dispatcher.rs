//! Event dispatch table
//!
//! Routes each [`SyncEvent`] kind to the cache handlers that react to it.
//! Events are handled one at a time, in arrival order.

use crate::assets::AssetCacheManager;
use crate::balances::BalanceCacheManager;
use crate::events::SyncEvent;
use std::sync::Arc;

/// Routes bus events to the asset and balance caches
#[derive(Clone)]
pub struct Dispatcher {
    assets: Arc<AssetCacheManager>,
    balances: Arc<BalanceCacheManager>,
}

impl Dispatcher {
    pub fn new(assets: Arc<AssetCacheManager>, balances: Arc<BalanceCacheManager>) -> Self {
        Self { assets, balances }
    }

    /// Handle one event
    pub async fn dispatch(&self, event: &SyncEvent) {
        tracing::trace!(event = event.kind(), "Dispatching event");

        match event {
            SyncEvent::AccountAdded(account) => {
                // assets first so the balance fetch prices the fresh asset list
                self.assets.on_account_added(account).await;
                self.balances.on_account_added(account).await;
            }
            SyncEvent::AccountRemoved(account_id) => {
                self.assets.on_account_removed(account_id);
                self.balances.on_account_removed(account_id);
            }
            SyncEvent::ExternalAssetListUpdated(delta) => {
                self.assets.on_account_asset_list_updated(delta).await;
            }
            SyncEvent::AccountBalancesUpdated(push) => {
                self.balances.on_account_balances_updated(push);
            }
            SyncEvent::AssetListChanged(delta) => {
                self.balances.on_asset_list_changed(delta).await;
            }
            // Produced for persistence and UI subscribers
            SyncEvent::AssetsStateChanged(_) | SyncEvent::BalancesStateChanged(_) => {}
        }
    }
}
