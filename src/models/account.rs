//! Account models - accounts as enumerated by the account registry

use serde::{Deserialize, Serialize};

/// Account identifier (registry-assigned, opaque)
pub type AccountId = String;

/// Identifier of the external module (plugin) that backs an account
pub type ModuleId = String;

/// Account type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// Natively understood EVM account
    Evm,
    /// Non-EVM account (Solana, Bitcoin, ...)
    NonEvm,
}

impl std::fmt::Display for AccountKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountKind::Evm => write!(f, "evm"),
            AccountKind::NonEvm => write!(f, "non-evm"),
        }
    }
}

/// Account as seen by the sync engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub kind: AccountKind,
    /// Backing module, absent for natively understood account kinds
    #[serde(default, rename = "moduleId")]
    pub module_id: Option<ModuleId>,
}

impl Account {
    /// Create a non-EVM account backed by `module_id`
    pub fn non_evm(id: impl Into<AccountId>, module_id: impl Into<ModuleId>) -> Self {
        Self {
            id: id.into(),
            kind: AccountKind::NonEvm,
            module_id: Some(module_id.into()),
        }
    }

    /// Create a natively understood EVM account
    pub fn evm(id: impl Into<AccountId>) -> Self {
        Self {
            id: id.into(),
            kind: AccountKind::Evm,
            module_id: None,
        }
    }

    /// Module backing this account, if it participates in asset sync
    pub fn sync_module(&self) -> Option<&str> {
        match self.kind {
            AccountKind::NonEvm => self.module_id.as_deref(),
            AccountKind::Evm => None,
        }
    }
}
