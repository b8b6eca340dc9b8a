//! Integration tests for the asset cache
//!
//! Tests screening on ingestion, curated add/ignore, metadata routing and
//! account removal against in-memory collaborators.

use crate::support::*;
use asset_sync::{
    models::{Account, AccountAssetChange, AssetId, AssetListDelta},
    token::TokenRiskLevel,
    AppError, AssetsState, SyncEvent,
};

fn delta(account_id: &str, change: AccountAssetChange) -> AssetListDelta {
    AssetListDelta::from([(account_id.to_string(), change)])
}

fn assert_disjoint(harness: &Harness, account_id: &str) {
    let state = harness.assets.state();
    let known = state.known_assets(account_id);
    for ignored in state.ignored(account_id) {
        assert!(!known.contains(ignored), "{ignored} is both known and ignored");
    }
}

/// Malicious tokens never reach the known set on account add
#[tokio::test]
async fn test_account_added_screens_malicious_tokens() {
    let harness = Harness::new(
        vec![Account::non_evm("acct1", MODULE)],
        MapClassifier::with_verdicts(&[
            ("benign", TokenRiskLevel::Benign),
            ("bad", TokenRiskLevel::Malicious),
        ]),
    );
    harness
        .gateway
        .set_assets("acct1", vec![native(), token("benign"), token("bad")]);

    harness
        .assets
        .on_account_added(&Account::non_evm("acct1", MODULE))
        .await;

    assert_eq!(
        harness.assets.state().known_assets("acct1"),
        &[native(), token("benign")]
    );
}

/// Asset list delta on an untracked account goes through the same screening
#[tokio::test]
async fn test_asset_list_update_screens_malicious_tokens() {
    let harness = Harness::new(
        vec![Account::non_evm("acct1", MODULE)],
        MapClassifier::with_verdicts(&[("tokenMalicious", TokenRiskLevel::Malicious)]),
    );
    let mut rx = harness.bus.subscribe();

    harness
        .assets
        .on_account_asset_list_updated(&delta(
            "acct1",
            AccountAssetChange::added(vec![native(), token("tokenA"), token("tokenMalicious")]),
        ))
        .await;

    assert_eq!(
        harness.assets.state().known_assets("acct1"),
        &[native(), token("tokenA")]
    );

    let event = wait_for(&mut rx, |e| matches!(e, SyncEvent::AssetListChanged(_))).await;
    let SyncEvent::AssetListChanged(effective) = event else {
        unreachable!()
    };
    assert_eq!(effective["acct1"].added, vec![native(), token("tokenA")]);
    assert!(effective["acct1"].removed.is_empty());
}

/// A rejected classifier call keeps every candidate of that batch
#[tokio::test]
async fn test_classifier_rejection_fails_open() {
    let harness = Harness::new(
        vec![Account::non_evm("acct1", MODULE)],
        MapClassifier::with_verdicts(&[("bad", TokenRiskLevel::Malicious)]).rejecting(0),
    );
    harness
        .gateway
        .set_assets("acct1", vec![token("good"), token("bad")]);

    harness
        .assets
        .on_account_added(&Account::non_evm("acct1", MODULE))
        .await;

    assert_eq!(
        harness.assets.state().known_assets("acct1"),
        &[token("good"), token("bad")]
    );
}

/// 120 candidates: batch of 100 flags one, batch of 20 rejects
#[tokio::test]
async fn test_partial_batch_failure_keeps_119_of_120() {
    let harness = Harness::new(
        vec![Account::non_evm("acct1", MODULE)],
        MapClassifier::with_verdicts(&[("t7", TokenRiskLevel::Malicious)]).rejecting(1),
    );
    let candidates: Vec<AssetId> = (0..120).map(|i| token(&format!("t{i}"))).collect();
    harness.gateway.set_assets("acct1", candidates.clone());

    harness
        .assets
        .on_account_added(&Account::non_evm("acct1", MODULE))
        .await;

    let known = harness.assets.state().known_assets("acct1").to_vec();
    assert_eq!(harness.classifier.call_sizes(), vec![100, 20]);
    assert_eq!(known.len(), 119);
    assert!(!known.contains(&token("t7")));
    assert!(known.contains(&token("t119")));
}

/// Curated add of known assets is a silent no-op
#[tokio::test]
async fn test_curated_add_is_idempotent() {
    let harness = Harness::new(vec![Account::non_evm("acct1", MODULE)], MapClassifier::default());
    let first = harness
        .assets
        .add_assets(&[native(), token("usdc")], "acct1")
        .unwrap();

    let mut rx = harness.bus.subscribe();
    let second = harness
        .assets
        .add_assets(&[token("usdc")], "acct1")
        .unwrap();

    assert_eq!(first, second);
    assert!(drain(&mut rx).is_empty());
}

/// Curated add is trusted and never hits the classifier
#[tokio::test]
async fn test_curated_add_is_not_screened() {
    let harness = Harness::new(
        vec![Account::non_evm("acct1", MODULE)],
        MapClassifier::with_verdicts(&[("bad", TokenRiskLevel::Malicious)]),
    );

    let known = harness.assets.add_assets(&[token("bad")], "acct1").unwrap();

    assert_eq!(known, vec![token("bad")]);
    assert!(harness.classifier.call_sizes().is_empty());
}

/// Mixed chains are rejected before any state change
#[tokio::test]
async fn test_curated_add_rejects_mixed_namespaces() {
    let harness = Harness::new(vec![Account::non_evm("acct1", MODULE)], MapClassifier::default());
    let other = AssetId::new("bip122:000000000019d6689c085ae165831e93/slip44:0");

    let err = harness
        .assets
        .add_assets(&[token("usdc"), other], "acct1")
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(err.to_string().contains("All assets must belong to the same chain"));
    assert!(harness.assets.state().known_assets("acct1").is_empty());
}

/// Ignore then curated add restores the asset
#[tokio::test]
async fn test_ignore_then_add_round_trip() {
    let harness = Harness::new(vec![Account::non_evm("acct1", MODULE)], MapClassifier::default());
    harness
        .assets
        .add_assets(&[native(), token("usdc")], "acct1")
        .unwrap();

    let mut rx = harness.bus.subscribe();
    harness.assets.ignore_assets(&[token("usdc")], "acct1");
    assert_disjoint(&harness, "acct1");
    assert_eq!(harness.assets.ignored_assets("acct1"), vec![token("usdc")]);
    assert_eq!(harness.assets.state().known_assets("acct1"), &[native()]);

    let event = wait_for(&mut rx, |e| matches!(e, SyncEvent::AssetListChanged(_))).await;
    let SyncEvent::AssetListChanged(effective) = event else {
        unreachable!()
    };
    assert_eq!(effective["acct1"].removed, vec![token("usdc")]);

    let known = harness.assets.add_assets(&[token("usdc")], "acct1").unwrap();
    assert_eq!(known, vec![native(), token("usdc")]);
    assert!(harness.assets.ignored_assets("acct1").is_empty());
    assert_disjoint(&harness, "acct1");
}

/// Ignored assets stay out even when a module reports them again
#[tokio::test]
async fn test_ignored_assets_are_not_re_added_by_delta() {
    let harness = Harness::new(vec![Account::non_evm("acct1", MODULE)], MapClassifier::default());
    harness.assets.add_assets(&[token("spam")], "acct1").unwrap();
    harness.assets.ignore_assets(&[token("spam")], "acct1");

    let mut rx = harness.bus.subscribe();
    harness
        .assets
        .on_account_asset_list_updated(&delta(
            "acct1",
            AccountAssetChange::added(vec![token("spam")]),
        ))
        .await;

    assert!(harness.assets.state().known_assets("acct1").is_empty());
    assert!(drain(&mut rx).is_empty());
    assert_disjoint(&harness, "acct1");
}

/// Removing an account leaves other accounts untouched
#[tokio::test]
async fn test_account_removal_purges_only_that_account() {
    let harness = Harness::new(
        vec![
            Account::non_evm("acct1", MODULE),
            Account::non_evm("acct2", MODULE),
        ],
        MapClassifier::default(),
    );
    harness
        .assets
        .add_assets(&[native(), token("a")], "acct1")
        .unwrap();
    harness.assets.ignore_assets(&[token("a")], "acct1");
    harness
        .assets
        .add_assets(&[native(), token("b")], "acct2")
        .unwrap();
    harness.assets.ignore_assets(&[token("b")], "acct2");

    let before = harness.assets.state();
    harness.assets.on_account_removed("acct1");
    let after = harness.assets.state();

    assert!(!after.is_tracked("acct1"));
    assert!(after.ignored("acct1").is_empty());
    assert_eq!(after.accounts_assets.get("acct2"), before.accounts_assets.get("acct2"));
    assert_eq!(after.ignored_assets.get("acct2"), before.ignored_assets.get("acct2"));
}

/// Metadata is fetched only for authorized namespaces and cached
#[tokio::test]
async fn test_metadata_fetched_for_authorized_namespace() {
    let harness = Harness::new(vec![Account::non_evm("acct1", MODULE)], MapClassifier::default());
    let foreign = AssetId::new("bip122:000000000019d6689c085ae165831e93/slip44:0");
    harness
        .gateway
        .set_assets("acct1", vec![native(), token("usdc"), foreign.clone()]);
    harness.gateway.set_metadata(native(), metadata("SOL"));
    harness.gateway.set_metadata(token("usdc"), metadata("USDC"));

    harness
        .assets
        .on_account_added(&Account::non_evm("acct1", MODULE))
        .await;

    let requests = harness.gateway.metadata_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, CHAIN);
    assert!(!requests[0].1.contains(&foreign));

    let usdc = harness.assets.get_asset_metadata(&token("usdc")).unwrap();
    assert_eq!(usdc.symbol_or_default(&token("usdc")), "USDC");
    assert!(harness.assets.get_asset_metadata(&foreign).is_none());
}

/// A module failure on account add stores nothing
#[tokio::test]
async fn test_resolve_failure_leaves_account_untracked() {
    let harness = Harness::new(vec![Account::non_evm("acct1", MODULE)], MapClassifier::default());
    harness.gateway.fail_account("acct1");

    harness
        .assets
        .on_account_added(&Account::non_evm("acct1", MODULE))
        .await;

    assert!(!harness.assets.state().is_tracked("acct1"));
}

/// Accounts without a module are never synced
#[tokio::test]
async fn test_evm_account_is_skipped() {
    let harness = Harness::new(vec![Account::evm("0xabc")], MapClassifier::default());
    harness.gateway.set_assets("0xabc", vec![native()]);

    harness.assets.on_account_added(&Account::evm("0xabc")).await;

    assert!(!harness.assets.state().is_tracked("0xabc"));
}

/// One namespace failing to serve metadata does not block the others
#[tokio::test]
async fn test_failed_namespace_metadata_does_not_block_others() {
    let harness = Harness::build(
        vec![Account::non_evm("acct1", MODULE)],
        MapClassifier::default(),
        StaticCapabilities::allowing(MODULE, &[CHAIN, BITCOIN]),
        AssetsState::default(),
    );
    let btc = AssetId::new(format!("{BITCOIN}/slip44:0"));
    harness
        .gateway
        .set_assets("acct1", vec![native(), token("usdc"), btc.clone()]);
    harness.gateway.set_metadata(native(), metadata("SOL"));
    harness.gateway.set_metadata(token("usdc"), metadata("USDC"));
    harness.gateway.set_metadata(btc.clone(), metadata("BTC"));
    harness.gateway.fail_namespace(BITCOIN);

    harness
        .assets
        .on_account_added(&Account::non_evm("acct1", MODULE))
        .await;

    let mut namespaces: Vec<String> = harness
        .gateway
        .metadata_requests()
        .into_iter()
        .map(|(namespace, _)| namespace)
        .collect();
    namespaces.sort();
    assert_eq!(namespaces, vec![BITCOIN.to_string(), CHAIN.to_string()]);

    assert!(harness.assets.get_asset_metadata(&btc).is_none());
    assert!(harness.assets.get_asset_metadata(&native()).is_some());
    assert!(harness.assets.get_asset_metadata(&token("usdc")).is_some());
    assert_eq!(
        harness.assets.state().known_assets("acct1"),
        &[native(), token("usdc"), btc]
    );
}

/// Delta path asks for metadata of new, screened-in ids only
#[tokio::test]
async fn test_delta_fetches_metadata_only_for_new_benign_assets() {
    let mut cached = AssetsState::default();
    cached
        .assets_metadata
        .insert(token("cached"), metadata("CCH"));
    let harness = Harness::build(
        vec![Account::non_evm("acct1", MODULE)],
        MapClassifier::with_verdicts(&[("bad", TokenRiskLevel::Malicious)]),
        StaticCapabilities::allowing(MODULE, &[CHAIN]),
        cached,
    );
    harness.gateway.set_metadata(token("fresh"), metadata("FRSH"));

    harness
        .assets
        .on_account_asset_list_updated(&delta(
            "acct1",
            AccountAssetChange::added(vec![token("cached"), token("fresh"), token("bad")]),
        ))
        .await;

    assert_eq!(
        harness.gateway.metadata_requests(),
        vec![(CHAIN.to_string(), vec![token("fresh")])]
    );
    assert_eq!(
        harness.assets.state().known_assets("acct1"),
        &[token("cached"), token("fresh")]
    );
    let fresh = harness.assets.get_asset_metadata(&token("fresh")).unwrap();
    assert_eq!(fresh.symbol.as_deref(), Some("FRSH"));
}

/// Ignoring an already-ignored id changes nothing and emits nothing
#[tokio::test]
async fn test_repeated_ignore_is_silent() {
    let mut harness =
        Harness::new(vec![Account::non_evm("acct1", MODULE)], MapClassifier::default());
    harness.assets.add_assets(&[token("spam")], "acct1").unwrap();
    harness.assets.ignore_assets(&[token("spam")], "acct1");

    let queued = harness.queued();
    assert!(queued.iter().any(|e| matches!(
        e,
        SyncEvent::AssetListChanged(d) if d["acct1"].removed == vec![token("spam")]
    )));

    let mut rx = harness.bus.subscribe();
    let before = harness.assets.state();
    harness.assets.ignore_assets(&[token("spam")], "acct1");

    assert_eq!(harness.assets.state(), before);
    assert!(drain(&mut rx).is_empty());
    assert!(harness.queued().is_empty());
}

/// Curated add of nothing leaves an untracked account untracked
#[tokio::test]
async fn test_empty_curated_add_does_not_track_account() {
    let mut harness =
        Harness::new(vec![Account::non_evm("acct9", MODULE)], MapClassifier::default());
    let mut rx = harness.bus.subscribe();

    let known = harness.assets.add_assets(&[], "acct9").unwrap();

    assert!(known.is_empty());
    assert!(!harness.assets.state().is_tracked("acct9"));
    assert!(drain(&mut rx).is_empty());
    assert!(harness.queued().is_empty());
}
