//! Asset cache: per-account known/ignored asset sets and the metadata cache

mod manager;
mod state;

pub use manager::*;
pub use state::*;

use crate::models::AssetId;

/// Read-only query other components use to see an account's known assets
pub trait KnownAssets: Send + Sync {
    fn known_assets(&self, account_id: &str) -> Vec<AssetId>;
}
