//! Typed in-process event bus
//!
//! Carries account lifecycle events, external asset/balance pushes and the
//! events produced by the caches:
//! - `AssetListChanged`: effective per-account asset delta
//! - `AssetsStateChanged` / `BalancesStateChanged`: full state snapshots

use crate::assets::AssetsState;
use crate::balances::BalancesState;
use crate::models::{Account, AccountId, AssetListDelta, BalancePush};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc};

/// Events exchanged between the registry, plugin layer and caches
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum SyncEvent {
    /// Account created in the registry
    #[serde(rename = "account_added")]
    AccountAdded(Account),

    /// Account deleted from the registry
    #[serde(rename = "account_removed")]
    AccountRemoved(AccountId),

    /// Raw asset list delta pushed by account modules
    #[serde(rename = "external_asset_list_updated")]
    ExternalAssetListUpdated(AssetListDelta),

    /// Bulk balance push from account modules
    #[serde(rename = "account_balances_updated")]
    AccountBalancesUpdated(BalancePush),

    /// Effective asset delta produced by the asset cache
    #[serde(rename = "asset_list_changed")]
    AssetListChanged(AssetListDelta),

    /// Asset cache snapshot after a mutation
    #[serde(rename = "assets_state_changed")]
    AssetsStateChanged(AssetsState),

    /// Balance cache snapshot after a mutation
    #[serde(rename = "balances_state_changed")]
    BalancesStateChanged(BalancesState),
}

impl SyncEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            SyncEvent::AccountAdded(_) => "account_added",
            SyncEvent::AccountRemoved(_) => "account_removed",
            SyncEvent::ExternalAssetListUpdated(_) => "external_asset_list_updated",
            SyncEvent::AccountBalancesUpdated(_) => "account_balances_updated",
            SyncEvent::AssetListChanged(_) => "asset_list_changed",
            SyncEvent::AssetsStateChanged(_) => "assets_state_changed",
            SyncEvent::BalancesStateChanged(_) => "balances_state_changed",
        }
    }
}

/// Receiving end of the dispatcher inbox
pub type EventInbox = mpsc::UnboundedReceiver<SyncEvent>;

/// Event bus with two lanes:
/// - inbox: lossless, ordered queue consumed by the dispatcher
/// - broadcast: lossy fan-out of produced events to subscribers
///
/// A slow subscriber may lag and miss notifications; the inbox never drops.
/// It is unbounded because handlers enqueue follow-up events from inside the
/// dispatch loop that drains it.
#[derive(Clone)]
pub struct EventBus {
    inbox: mpsc::UnboundedSender<SyncEvent>,
    tx: broadcast::Sender<SyncEvent>,
}

impl EventBus {
    /// Create a bus; `capacity` bounds the subscriber ring only
    pub fn new(capacity: usize) -> (Self, EventInbox) {
        let (inbox, inbox_rx) = mpsc::unbounded_channel();
        let (tx, _) = broadcast::channel(capacity.max(1));
        (Self { inbox, tx }, inbox_rx)
    }

    /// Queue an event for the dispatcher
    pub fn enqueue(&self, event: SyncEvent) {
        if let Err(e) = self.inbox.send(event) {
            tracing::debug!(event = e.0.kind(), "Dispatcher gone, event not queued");
        }
    }

    /// Notify all subscribers
    pub fn publish(&self, event: SyncEvent) {
        let kind = event.kind();
        // No subscribers is not an error for producers
        if self.tx.send(event).is_err() {
            tracing::trace!(event = kind, "Event published with no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
