//! Collaborator interfaces consumed by the sync engine
//!
//! Each manager receives the clients it needs at construction time:
//! - [`AccountRegistry`]: account enumeration and lookup
//! - [`ModuleAssetGateway`]: asset lists, balances and metadata served by account modules
//! - [`CapabilityResolver`]: chain namespaces a module is authorized to serve
//! - [`SessionState`]: wallet lock state

use crate::models::{Account, AssetBalances, AssetId, AssetMetadataMap};

/// Account registry reader
#[async_trait::async_trait]
pub trait AccountRegistry: Send + Sync {
    /// Enumerate all accounts (fresh snapshot on every call)
    async fn list_accounts(&self) -> Vec<Account>;

    /// Look up a single account by id
    async fn get_account(&self, account_id: &str) -> Option<Account> {
        self.list_accounts()
            .await
            .into_iter()
            .find(|account| account.id == account_id)
    }
}

/// Request/response gateway into the module that backs an account
#[async_trait::async_trait]
pub trait ModuleAssetGateway: Send + Sync {
    /// Full list of assets held by `account_id`
    async fn resolve_assets(&self, module_id: &str, account_id: &str)
        -> anyhow::Result<Vec<AssetId>>;

    /// Balances for `asset_ids`; entries the module cannot compute are omitted
    async fn resolve_balances(
        &self,
        module_id: &str,
        account_id: &str,
        asset_ids: &[AssetId],
    ) -> anyhow::Result<AssetBalances>;

    /// Metadata for `asset_ids`, all within `namespace`
    async fn resolve_metadata(
        &self,
        module_id: &str,
        namespace: &str,
        asset_ids: &[AssetId],
    ) -> anyhow::Result<AssetMetadataMap>;
}

/// Capability lookup for modules
#[async_trait::async_trait]
pub trait CapabilityResolver: Send + Sync {
    /// Chain namespaces `module_id` may serve assets for.
    /// `None` or an empty list means unauthorized for all.
    async fn authorized_namespaces(&self, module_id: &str) -> Option<Vec<String>>;
}

/// Wallet session state probe
pub trait SessionState: Send + Sync {
    fn is_unlocked(&self) -> bool;
}
