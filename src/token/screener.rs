//! TokenScreener - drops malicious tokens from auto-detected asset lists
//!
//! Policy:
//! - Native (`slip44`) assets always pass and are never sent to the classifier
//! - Token assets are grouped by chain namespace and classified in batches
//! - Batches settle independently; a failed batch keeps all of its tokens
//! - Only an explicit `Malicious` verdict drops a token (fail-open otherwise)

use super::{TokenSafetyClassifier, TokenScanResults, MAX_SCAN_BATCH_SIZE};
use crate::config::ScreeningConfig;
use crate::models::AssetId;
use futures_util::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of one classifier call
#[derive(Debug)]
enum BatchOutcome {
    Fulfilled(TokenScanResults),
    Rejected(anyhow::Error),
}

/// Batching front-end over a [`TokenSafetyClassifier`]
pub struct TokenScreener {
    classifier: Arc<dyn TokenSafetyClassifier>,
    batch_size: usize,
    enabled: bool,
}

impl TokenScreener {
    /// Create a screener; batch size is clamped to `1..=MAX_SCAN_BATCH_SIZE`
    pub fn new(classifier: Arc<dyn TokenSafetyClassifier>, config: &ScreeningConfig) -> Self {
        Self {
            classifier,
            batch_size: config.batch_size.clamp(1, MAX_SCAN_BATCH_SIZE),
            enabled: config.enabled,
        }
    }

    /// Return `candidates` minus the tokens classified as malicious, order preserved
    pub async fn filter_malicious(&self, candidates: Vec<AssetId>) -> Vec<AssetId> {
        if !self.enabled || candidates.is_empty() {
            return candidates;
        }

        // namespace -> unique token addresses, in first-seen order
        let mut by_namespace: Vec<(String, Vec<String>)> = Vec::new();
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        for asset in candidates.iter().filter(|asset| !asset.is_native()) {
            let (namespace, address) = (asset.namespace(), asset.reference());
            if !seen.insert((namespace, address)) {
                continue;
            }
            match by_namespace.iter_mut().find(|(ns, _)| ns == namespace) {
                Some((_, addresses)) => addresses.push(address.to_string()),
                None => by_namespace.push((namespace.to_string(), vec![address.to_string()])),
            }
        }

        if by_namespace.is_empty() {
            return candidates;
        }

        let batches = by_namespace.iter().flat_map(|(namespace, addresses)| {
            addresses
                .chunks(self.batch_size)
                .map(move |chunk| (namespace.as_str(), chunk))
        });

        let settled = join_all(batches.map(|(namespace, chunk)| async move {
            let outcome = match self.classifier.classify_tokens(namespace, chunk).await {
                Ok(results) => BatchOutcome::Fulfilled(results),
                Err(e) => BatchOutcome::Rejected(e),
            };
            (namespace, chunk, outcome)
        }))
        .await;

        let mut malicious: HashSet<(&str, &str)> = HashSet::new();
        for (namespace, chunk, outcome) in settled {
            match outcome {
                BatchOutcome::Fulfilled(results) => {
                    for address in chunk {
                        if results
                            .get(address)
                            .is_some_and(|scan| scan.result_type.is_malicious())
                        {
                            tracing::debug!(
                                namespace = namespace,
                                address = %address,
                                "Dropping token classified as malicious"
                            );
                            malicious.insert((namespace, address.as_str()));
                        }
                    }
                }
                BatchOutcome::Rejected(e) => {
                    tracing::warn!(
                        namespace = namespace,
                        batch_len = chunk.len(),
                        error = %e,
                        "Token scan failed, keeping batch unscreened"
                    );
                }
            }
        }

        if malicious.is_empty() {
            return candidates;
        }

        let kept: Vec<AssetId> = candidates
            .iter()
            .filter(|asset| {
                asset.is_native() || !malicious.contains(&(asset.namespace(), asset.reference()))
            })
            .cloned()
            .collect();

        tracing::info!(
            candidates = candidates.len(),
            dropped = candidates.len() - kept.len(),
            "Token screening complete"
        );

        kept
    }
}
