//! Contract Test: Shutdown Determinism
//!
//! Constraints verified:
//! - The shutdown signal aborts the in-flight provider check, which
//!   contributes no outcome (never a partial one)
//! - The run summary is still finalized with the totals accumulated so far
//!
//! If this test fails, cancellation corrupts the run ledger.

mod common;

use common::*;
use rbl_core::{CheckConfig, CheckEngine, LookupTarget, Provider, ProviderRegistry};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_inflight_check_and_finalizes_summary() {
    // Each lookup takes 1s of virtual time; shutdown fires at 1.5s, midway
    // through the second lookup.
    let resolver = Arc::new(ScriptedResolver::new().with_delay(Duration::from_secs(1)));
    let sink = Arc::new(CountingSink::new());
    let engine = CheckEngine::new(
        Box::new(ScriptedResolver::sharing_log_with(&resolver)),
        Box::new(CountingSink::sharing_counters_with(&sink)),
        CheckConfig::default(),
    )
    .unwrap();

    let registry = ProviderRegistry::from_providers(vec![
        Provider::new(1, "First BL", "one.example.com"),
        Provider::new(2, "Second BL", "two.example.com"),
    ]);
    let targets = vec![
        LookupTarget::new("1.2.3.4", "site-a"),
        LookupTarget::new("5.6.7.8", "site-b"),
    ];

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(1500)).await;
        shutdown_tx.send(()).unwrap();
    });

    let summary = engine
        .check_all_targets_with_shutdown("owner", &targets, &registry, shutdown_rx)
        .await
        .unwrap();

    // First check completed, second was in flight when the signal landed.
    assert_eq!(resolver.lookup_count(), 2);
    assert_eq!(
        sink.record_call_count(),
        1,
        "an aborted check must not record a partial outcome"
    );
    assert_eq!(summary.total_checks, 1);
    assert_eq!(summary.total_targets, 2);
    assert!(summary.completed_at.is_some(), "summary finalized despite abort");
    assert_eq!(sink.complete_call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn unused_shutdown_channel_leaves_run_untouched() {
    let resolver = Arc::new(ScriptedResolver::new());
    let sink = Arc::new(CountingSink::new());
    let engine = CheckEngine::new(
        Box::new(ScriptedResolver::sharing_log_with(&resolver)),
        Box::new(CountingSink::sharing_counters_with(&sink)),
        CheckConfig::default(),
    )
    .unwrap();

    let registry = ProviderRegistry::from_providers(vec![
        Provider::new(1, "First BL", "one.example.com"),
    ]);
    let targets = vec![LookupTarget::new("1.2.3.4", "site-a")];

    let (_shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    let summary = engine
        .check_all_targets_with_shutdown("owner", &targets, &registry, shutdown_rx)
        .await
        .unwrap();

    assert_eq!(summary.total_checks, 1);
    assert_eq!(sink.record_call_count(), 1);
}
