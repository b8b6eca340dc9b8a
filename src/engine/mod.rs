//! Sync engine for the asset and balance caches
//!
//! Wires the caches to the event bus and runs the dispatch loop.

mod dispatcher;

pub use dispatcher::*;

use crate::assets::{AssetCacheManager, AssetsState};
use crate::balances::{BalanceCacheManager, BalancesState};
use crate::clients::{AccountRegistry, CapabilityResolver, ModuleAssetGateway, SessionState};
use crate::config::AppConfig;
use crate::events::{EventBus, EventInbox, SyncEvent};
use crate::token::{TokenSafetyClassifier, TokenScreener};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// External collaborators injected into the caches
#[derive(Clone)]
pub struct SyncClients {
    pub registry: Arc<dyn AccountRegistry>,
    pub gateway: Arc<dyn ModuleAssetGateway>,
    pub capabilities: Arc<dyn CapabilityResolver>,
    pub classifier: Arc<dyn TokenSafetyClassifier>,
    pub session: Arc<dyn SessionState>,
}

/// Engine handle for external interaction
#[derive(Clone)]
pub struct EngineHandle {
    bus: EventBus,
    assets: Arc<AssetCacheManager>,
    balances: Arc<BalanceCacheManager>,
    cancel_token: CancellationToken,
}

impl EngineHandle {
    /// Queue an input event for the dispatch loop; never dropped
    pub fn publish(&self, event: SyncEvent) {
        self.bus.enqueue(event);
    }

    /// Subscribe to produced events (asset delta, state snapshots).
    /// A subscriber that falls behind misses notifications, never inputs.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.bus.subscribe()
    }

    pub fn assets(&self) -> &Arc<AssetCacheManager> {
        &self.assets
    }

    pub fn balances(&self) -> &Arc<BalanceCacheManager> {
        &self.balances
    }

    /// Stop the dispatch loop
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

/// Sync engine: owns the dispatch loop
pub struct SyncEngine {
    dispatcher: Dispatcher,
    balances: Arc<BalanceCacheManager>,
    inbox: EventInbox,
    refresh_interval: Option<Duration>,
    cancel_token: CancellationToken,
}

impl SyncEngine {
    /// Create an engine with empty caches
    pub fn new(config: &AppConfig, clients: SyncClients) -> (Self, EngineHandle) {
        Self::with_state(
            config,
            clients,
            AssetsState::default(),
            BalancesState::default(),
        )
    }

    /// Create an engine from persisted cache snapshots
    pub fn with_state(
        config: &AppConfig,
        clients: SyncClients,
        assets_state: AssetsState,
        balances_state: BalancesState,
    ) -> (Self, EngineHandle) {
        let (bus, inbox) = EventBus::new(config.events.capacity);

        let screener = TokenScreener::new(clients.classifier.clone(), &config.screening);
        let assets = Arc::new(
            AssetCacheManager::new(
                clients.gateway.clone(),
                clients.capabilities.clone(),
                clients.registry.clone(),
                screener,
                bus.clone(),
            )
            .with_state(assets_state),
        );
        let balances = Arc::new(
            BalanceCacheManager::new(
                clients.gateway.clone(),
                clients.registry.clone(),
                assets.clone(),
                clients.session.clone(),
                bus.clone(),
            )
            .with_state(balances_state),
        );

        let cancel_token = CancellationToken::new();
        let handle = EngineHandle {
            bus,
            assets: assets.clone(),
            balances: balances.clone(),
            cancel_token: cancel_token.clone(),
        };

        let engine = Self {
            dispatcher: Dispatcher::new(assets, balances.clone()),
            balances,
            inbox,
            refresh_interval: config.balances.refresh_interval(),
            cancel_token,
        };

        (engine, handle)
    }

    /// Start the dispatch loop; returns after `EngineHandle::shutdown`
    pub async fn run(mut self) {
        tracing::info!(
            refresh_interval_secs = self.refresh_interval.map(|d| d.as_secs()),
            "Sync engine started"
        );

        let mut refresh = self.refresh_interval.map(|period| {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            interval
        });

        loop {
            tokio::select! {
                biased;
                _ = self.cancel_token.cancelled() => {
                    tracing::info!("Sync engine shutting down");
                    break;
                }
                received = self.inbox.recv() => match received {
                    Some(event) => self.dispatcher.dispatch(&event).await,
                    None => break,
                },
                _ = async {
                    match refresh.as_mut() {
                        Some(interval) => { interval.tick().await; }
                        None => std::future::pending::<()>().await,
                    }
                } => {
                    self.balances.update_balances().await;
                }
            }
        }
    }

    /// Spawn the dispatch loop on the current runtime
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
