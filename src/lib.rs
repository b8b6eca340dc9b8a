//! Asset Sync Library
//!
//! Keeps per-account asset lists, asset metadata and balances in sync with
//! the modules that back non-EVM accounts, screening auto-detected tokens
//! through a token safety classifier before they are cached.

pub mod assets;
pub mod balances;
pub mod clients;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod token;

// Re-export commonly used types
pub use assets::{AssetCacheManager, AssetsState, KnownAssets};
pub use balances::{BalanceCacheManager, BalancesState};
pub use clients::{AccountRegistry, CapabilityResolver, ModuleAssetGateway, SessionState};
pub use config::AppConfig;
pub use engine::{Dispatcher, EngineHandle, SyncClients, SyncEngine};
pub use error::{AppError, AppResult};
pub use events::{EventBus, SyncEvent};
pub use models::{
    Account, AccountAssetChange, AccountId, AccountKind, AssetBalances, AssetId, AssetListDelta,
    AssetMetadata, Balance, BalancePush,
};
pub use token::{TokenRiskLevel, TokenSafetyClassifier, TokenScanResult, TokenScreener};
