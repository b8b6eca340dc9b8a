//! Token safety classifier interface
//!
//! The classifier is an external batch service: it receives a chain
//! namespace and up to `MAX_SCAN_BATCH_SIZE` token addresses and returns a
//! verdict per address it recognised.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hard upper bound on addresses per classifier call
pub const MAX_SCAN_BATCH_SIZE: usize = 100;

/// Classifier verdict for a single token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum TokenRiskLevel {
    Benign,
    Warning,
    Spam,
    Malicious,
    /// Any verdict this engine does not know about
    #[serde(other)]
    Unrecognized,
}

impl TokenRiskLevel {
    /// Only a malicious verdict removes a token
    pub fn is_malicious(&self) -> bool {
        matches!(self, TokenRiskLevel::Malicious)
    }
}

impl std::fmt::Display for TokenRiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenRiskLevel::Benign => write!(f, "Benign"),
            TokenRiskLevel::Warning => write!(f, "Warning"),
            TokenRiskLevel::Spam => write!(f, "Spam"),
            TokenRiskLevel::Malicious => write!(f, "Malicious"),
            TokenRiskLevel::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// Scan result for one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenScanResult {
    #[serde(rename = "resultType")]
    pub result_type: TokenRiskLevel,
}

impl TokenScanResult {
    pub fn new(result_type: TokenRiskLevel) -> Self {
        Self { result_type }
    }
}

/// Address -> scan result. Absent addresses are unknown.
pub type TokenScanResults = HashMap<String, TokenScanResult>;

/// External token safety classification service
#[async_trait::async_trait]
pub trait TokenSafetyClassifier: Send + Sync {
    async fn classify_tokens(
        &self,
        namespace: &str,
        addresses: &[String],
    ) -> anyhow::Result<TokenScanResults>;
}
