//! Asset models - CAIP-19 style asset identifiers and their metadata

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Asset kind that marks a chain's native asset
pub const NATIVE_ASSET_KIND: &str = "slip44";

/// Globally unique asset identifier: `<namespace>/<kind>:<value>`
///
/// Examples:
/// - `solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp/slip44:501` (native SOL)
/// - `solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp/token:EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v`
///
/// Equality is exact string equality; no normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Chain namespace prefix (everything before the first `/`)
    pub fn namespace(&self) -> &str {
        match self.0.split_once('/') {
            Some((namespace, _)) => namespace,
            None => &self.0,
        }
    }

    /// Asset-local part after the first `/` (e.g. `token:Abc`)
    fn local_part(&self) -> &str {
        self.0.split_once('/').map(|(_, rest)| rest).unwrap_or("")
    }

    /// Asset kind (`slip44`, `token`, `erc20`, ...)
    pub fn asset_kind(&self) -> &str {
        let local = self.local_part();
        local.split_once(':').map(|(kind, _)| kind).unwrap_or(local)
    }

    /// Asset-local reference (the token address for contract assets)
    pub fn reference(&self) -> &str {
        self.local_part()
            .split_once(':')
            .map(|(_, reference)| reference)
            .unwrap_or("")
    }

    /// Whether this is the chain's native asset
    pub fn is_native(&self) -> bool {
        self.asset_kind() == NATIVE_ASSET_KIND
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AssetId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Display unit of an asset (e.g. SOL with 9 decimals)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetUnit {
    pub name: String,
    pub symbol: String,
    #[serde(default)]
    pub decimals: u8,
}

/// Descriptive record for an asset, as returned by a module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default = "default_fungible")]
    pub fungible: bool,
    #[serde(default, rename = "iconUrl")]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub units: Vec<AssetUnit>,
}

fn default_fungible() -> bool {
    true
}

/// Display helpers for hosts rendering the cache; the caches themselves
/// store metadata as received.
impl AssetMetadata {
    /// Symbol to display, falling back to the asset-local reference
    pub fn symbol_or_default<'a>(&'a self, asset_id: &'a AssetId) -> &'a str {
        match self.symbol.as_deref() {
            Some(symbol) if !symbol.is_empty() => symbol,
            _ => asset_id.reference(),
        }
    }

    /// Decimal precision of the primary unit (0 when no unit is declared)
    pub fn decimals(&self) -> u8 {
        self.units.first().map(|unit| unit.decimals).unwrap_or(0)
    }
}

/// Metadata cache shape: asset id -> metadata
pub type AssetMetadataMap = HashMap<AssetId, AssetMetadata>;
