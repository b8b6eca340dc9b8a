//! Integration tests for the balance cache
//!
//! Tests wholesale refresh, incremental merge, bulk pushes, the lock gate
//! and account removal.

use crate::support::*;
use asset_sync::models::{Account, AccountAssetChange, AssetBalances, AssetListDelta, BalancePush};

fn harness_with(accounts: &[&str]) -> Harness {
    Harness::new(
        accounts
            .iter()
            .map(|id| Account::non_evm(*id, MODULE))
            .collect(),
        MapClassifier::default(),
    )
}

/// Incremental fetch only adds the new asset, existing entries are untouched
#[tokio::test]
async fn test_incremental_merge_keeps_existing_balances() {
    let harness = harness_with(&["acct1"]);
    harness.assets.add_assets(&[token("x")], "acct1").unwrap();
    harness.gateway.set_balance("acct1", token("x"), sol("55"));
    harness.balances.update_balance("acct1").await;

    // The module now reports a different X balance, which must not leak in
    harness.gateway.set_balance("acct1", token("x"), sol("1"));
    harness.gateway.set_balance("acct1", token("y"), sol("7"));

    let delta = AssetListDelta::from([(
        "acct1".to_string(),
        AccountAssetChange::added(vec![token("y")]),
    )]);
    harness.balances.on_asset_list_changed(&delta).await;

    let record = harness.balances.balances_for("acct1").unwrap();
    assert_eq!(record.len(), 2);
    assert_eq!(record[&token("x")], sol("55"));
    assert_eq!(record[&token("y")], sol("7"));

    let (_, requested) = harness.gateway.balance_requests().pop().unwrap();
    assert_eq!(requested, vec![token("y")]);
}

/// Removed assets are pruned from the balance record
#[tokio::test]
async fn test_removed_assets_are_pruned() {
    let harness = harness_with(&["acct1"]);
    harness
        .assets
        .add_assets(&[token("x"), token("y")], "acct1")
        .unwrap();
    harness.gateway.set_balance("acct1", token("x"), sol("1"));
    harness.gateway.set_balance("acct1", token("y"), sol("2"));
    harness.balances.update_balance("acct1").await;

    let delta = AssetListDelta::from([(
        "acct1".to_string(),
        AccountAssetChange::removed(vec![token("x")]),
    )]);
    harness.balances.on_asset_list_changed(&delta).await;

    let record = harness.balances.balances_for("acct1").unwrap();
    assert!(!record.contains_key(&token("x")));
    assert_eq!(record[&token("y")], sol("2"));
}

/// Wholesale refresh prices the known asset set of every module account
#[tokio::test]
async fn test_update_balances_replaces_records() {
    let harness = harness_with(&["acct1", "acct2"]);
    harness.assets.add_assets(&[native()], "acct1").unwrap();
    harness
        .assets
        .add_assets(&[native(), token("usdc")], "acct2")
        .unwrap();
    harness.gateway.set_balance("acct1", native(), sol("1.5"));
    harness.gateway.set_balance("acct2", native(), sol("0.1"));
    harness.gateway.set_balance("acct2", token("usdc"), sol("20"));

    harness.balances.update_balances().await;

    assert_eq!(
        harness.balances.balances_for("acct1"),
        Some(AssetBalances::from([(native(), sol("1.5"))]))
    );
    assert_eq!(harness.balances.balances_for("acct2").unwrap().len(), 2);
}

/// A failing module keeps the previous record
#[tokio::test]
async fn test_fetch_failure_keeps_previous_record() {
    let harness = harness_with(&["acct1"]);
    harness.assets.add_assets(&[native()], "acct1").unwrap();
    harness.gateway.set_balance("acct1", native(), sol("3"));
    harness.balances.update_balance("acct1").await;

    harness.gateway.fail_account("acct1");
    harness.balances.update_balances().await;

    assert_eq!(
        harness.balances.balances_for("acct1"),
        Some(AssetBalances::from([(native(), sol("3"))]))
    );
}

/// Locked wallet: no fetch, no state change, absent stays absent
#[tokio::test]
async fn test_locked_session_leaves_cache_untouched() {
    let harness = harness_with(&["acct1", "acct2"]);
    harness.assets.add_assets(&[native(), token("y")], "acct1").unwrap();
    harness.assets.add_assets(&[native()], "acct2").unwrap();
    harness.gateway.set_balance("acct1", native(), sol("1"));
    harness.gateway.set_balance("acct1", token("y"), sol("4"));
    harness.gateway.set_balance("acct2", native(), sol("2"));
    harness.balances.update_balance("acct1").await;
    let before = harness.balances.state();
    let requests_before = harness.gateway.balance_requests().len();

    harness.session.set_unlocked(false);
    harness.balances.update_balance("acct2").await;
    harness.balances.update_balances().await;
    harness
        .balances
        .on_asset_list_changed(&AssetListDelta::from([(
            "acct1".to_string(),
            AccountAssetChange {
                added: vec![token("z")],
                removed: vec![token("y")],
            },
        )]))
        .await;

    assert_eq!(harness.balances.state(), before);
    assert!(harness.balances.balances_for("acct2").is_none());
    assert_eq!(harness.gateway.balance_requests().len(), requests_before);
}

/// Pushes only land on accounts already tracked
#[tokio::test]
async fn test_balance_push_ignores_untracked_accounts() {
    let harness = harness_with(&["acct1"]);
    harness.assets.add_assets(&[native()], "acct1").unwrap();
    harness.gateway.set_balance("acct1", native(), sol("1"));
    harness.balances.update_balance("acct1").await;

    let push = BalancePush::from([
        (
            "acct1".to_string(),
            AssetBalances::from([(native(), sol("9")), (token("new"), sol("3"))]),
        ),
        ("stranger".to_string(), AssetBalances::from([(native(), sol("5"))])),
    ]);
    harness.balances.on_account_balances_updated(&push);

    let record = harness.balances.balances_for("acct1").unwrap();
    assert_eq!(record[&native()], sol("9"));
    assert_eq!(record[&token("new")], sol("3"));
    assert!(harness.balances.balances_for("stranger").is_none());
}

/// Removal drops exactly one account's balances
#[tokio::test]
async fn test_account_removal_purges_only_that_account() {
    let harness = harness_with(&["acct1", "acct2"]);
    for account in ["acct1", "acct2"] {
        harness.assets.add_assets(&[native()], account).unwrap();
        harness.gateway.set_balance(account, native(), sol("1"));
    }
    harness.balances.update_balances().await;
    let other = harness.balances.balances_for("acct2");

    harness.balances.on_account_removed("acct1");

    assert!(harness.balances.balances_for("acct1").is_none());
    assert_eq!(harness.balances.balances_for("acct2"), other);
}

/// Accounts unknown to the registry are never fetched
#[tokio::test]
async fn test_unknown_account_is_not_fetched() {
    let harness = harness_with(&[]);
    harness.balances.update_balance("ghost").await;

    assert!(harness.gateway.balance_requests().is_empty());
    assert!(harness.balances.balances_for("ghost").is_none());
}
