//! Core check engine
//!
//! The CheckEngine is responsible for:
//! - Composing name building, DNS lookup, and response classification into
//!   one provider check
//! - Enforcing each provider's rate limit and the per-check deadline
//! - Running the batch: every enabled provider for every target, feeding
//!   outcomes and the run summary to the ResultSink
//!
//! ## Architecture
//!
//! ```text
//!                      ┌──────────────┐
//!   targets ─────────► │ CheckEngine  │ ───► CheckRunSummary
//!                      └──────────────┘
//!                             │
//!              ┌──────────────┼──────────────┐
//!              ▼              ▼              ▼
//!      ┌──────────────┐ ┌────────────┐ ┌────────────┐
//!      │ query_name + │ │  Resolver  │ │ ResultSink │
//!      │  classify    │ │  (lookup)  │ │  (record)  │
//!      └──────────────┘ └────────────┘ └────────────┘
//! ```
//!
//! ## Resilience
//!
//! Every failure is local to one (target, provider) pair: a provider that
//! times out, answers garbage, or rejects the query contributes a
//! non-listed outcome with an error string and the run moves on. Nothing a
//! single provider does can abort a batch.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use tokio::sync::{Mutex, oneshot};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::classify::classify;
use crate::config::CheckConfig;
use crate::outcome::{CheckOutcome, CheckRunSummary, LookupTarget};
use crate::provider::{Provider, ProviderRegistry};
use crate::query_name::{NameRejection, build_query_name};
use crate::traits::{Resolver, ResultSink};
use crate::Result;

/// Grace added to the lookup timeout before a nominally successful check is
/// discarded as too slow.
const DEADLINE_GRACE: Duration = Duration::from_secs(1);

/// Core blacklist-check engine
///
/// ## Lifecycle
///
/// 1. Create with [`CheckEngine::new()`]
/// 2. Call [`CheckEngine::check_target()`] or [`CheckEngine::check_all_targets()`]
/// 3. The engine holds no per-run state afterwards; summaries and outcomes
///    live in the caller's ResultSink
///
/// ## Rate limiting
///
/// The engine owns a provider-keyed map of last-check timestamps. Before
/// querying a provider it sleeps out the remainder of that provider's
/// `rate_limit_ms` since its previous check — measured per provider across
/// the whole run, not per target, so total query volume per provider stays
/// within its configured floor.
pub struct CheckEngine {
    /// DNS lookup strategy
    resolver: Box<dyn Resolver>,

    /// Where outcomes and run records land
    sink: Box<dyn ResultSink>,

    /// Resolver/timeout configuration
    config: CheckConfig,

    /// Per-provider timestamp of the most recent check
    last_check: Mutex<HashMap<u32, Instant>>,
}

impl CheckEngine {
    /// Create a new check engine
    ///
    /// # Parameters
    ///
    /// - `resolver`: DNS lookup implementation
    /// - `sink`: ResultSink implementation
    /// - `config`: check configuration
    pub fn new(
        resolver: Box<dyn Resolver>,
        sink: Box<dyn ResultSink>,
        config: CheckConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            resolver,
            sink,
            config,
            last_check: Mutex::new(HashMap::new()),
        })
    }

    /// Check one IP against a single provider
    ///
    /// Sequence: build the reversed-octet query name (a rejection
    /// short-circuits into a non-listed outcome), resolve with the
    /// configured timeout, classify the answer. A check that comes back
    /// only after `timeout + 1s` has its result discarded and replaced
    /// with an "exceeded timeout" error so a slow path cannot poison the
    /// orchestrator's budget.
    pub async fn check_provider(&self, ip: &str, provider: &Provider) -> CheckOutcome {
        let started = Instant::now();
        let timeout = self.config.lookup_timeout();

        let name = match build_query_name(ip, &provider.dns_suffix) {
            Ok(name) => name,
            Err(rejection) => {
                let diagnostics = match &rejection {
                    NameRejection::Ipv6Unsupported { arpa_name } => {
                        vec![format!("Computed ip6.arpa form: {}", arpa_name)]
                    }
                    NameRejection::InvalidIp => Vec::new(),
                };
                debug!(ip, provider = %provider.name, error = %rejection, "lookup rejected");
                return CheckOutcome::failed(rejection.to_string(), diagnostics);
            }
        };

        debug!(
            lookup = %name,
            provider = %provider.name,
            strategy = self.resolver.strategy(),
            "checking provider"
        );

        let lookup = self.resolver.lookup_a(&name, timeout).await;
        let outcome = classify(&provider.dns_suffix, &lookup);

        // A decode that "succeeds" just past its budget is as useless as a
        // timeout; substitute rather than trust it.
        if started.elapsed() > timeout + DEADLINE_GRACE {
            warn!(
                lookup = %name,
                provider = %provider.name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "check exceeded its deadline, discarding result"
            );
            return CheckOutcome::failed("Check exceeded timeout", Vec::new());
        }

        outcome
    }

    /// Check one target against every checkable provider in the registry
    ///
    /// Providers are visited ascending by id. Each outcome is recorded via
    /// the ResultSink with upsert semantics, keyed by (target tag,
    /// provider id).
    ///
    /// # Returns
    ///
    /// A map from provider id to its outcome.
    pub async fn check_target(
        &self,
        target: &LookupTarget,
        registry: &ProviderRegistry,
    ) -> BTreeMap<u32, CheckOutcome> {
        let providers = registry.checkable();
        let mut shutdown = None;
        let (outcomes, _aborted) = self
            .check_target_inner(target, &providers, &mut shutdown)
            .await;
        outcomes
    }

    /// Check every target for an owner, producing a finalized run summary
    ///
    /// Opens a run record via the ResultSink, runs [`Self::check_target`]
    /// semantics for each target, and completes the run with the aggregate
    /// totals. A target counts toward `listed_target_count` once no matter
    /// how many providers list it.
    pub async fn check_all_targets(
        &self,
        owner_tag: &str,
        targets: &[LookupTarget],
        registry: &ProviderRegistry,
    ) -> Result<CheckRunSummary> {
        self.run_internal(owner_tag, targets, registry, None).await
    }

    /// Like [`Self::check_all_targets`], aborting early when the shutdown
    /// signal fires
    ///
    /// A provider check in flight when the signal arrives is dropped and
    /// contributes no outcome; the run summary is still finalized with the
    /// totals accumulated up to that point.
    pub async fn check_all_targets_with_shutdown(
        &self,
        owner_tag: &str,
        targets: &[LookupTarget],
        registry: &ProviderRegistry,
        shutdown_rx: oneshot::Receiver<()>,
    ) -> Result<CheckRunSummary> {
        self.run_internal(owner_tag, targets, registry, Some(shutdown_rx))
            .await
    }

    async fn run_internal(
        &self,
        owner_tag: &str,
        targets: &[LookupTarget],
        registry: &ProviderRegistry,
        mut shutdown_rx: Option<oneshot::Receiver<()>>,
    ) -> Result<CheckRunSummary> {
        let run_id = self.sink.start_run(owner_tag, targets.len()).await?;
        let mut summary = CheckRunSummary::open(run_id, targets.len());
        let providers = registry.checkable();

        info!(
            run_id,
            owner = owner_tag,
            targets = targets.len(),
            providers = providers.len(),
            "check run started"
        );

        for target in targets {
            let (outcomes, aborted) = self
                .check_target_inner(target, &providers, &mut shutdown_rx)
                .await;

            summary.total_checks += outcomes.len();
            if outcomes.values().any(|o| o.listed) {
                summary.listed_target_count += 1;
            }

            if aborted {
                info!(run_id, "shutdown signal received, aborting run");
                break;
            }
        }

        summary.finalize();
        self.sink
            .complete_run(run_id, summary.total_checks, summary.listed_target_count)
            .await?;

        info!(
            run_id,
            total_checks = summary.total_checks,
            listed_targets = summary.listed_target_count,
            "check run completed"
        );

        Ok(summary)
    }

    /// Run one target through the provider sequence
    ///
    /// Returns the collected outcomes and whether the run was aborted by
    /// the shutdown signal. An aborted in-flight check contributes no
    /// outcome.
    async fn check_target_inner(
        &self,
        target: &LookupTarget,
        providers: &[&Provider],
        shutdown_rx: &mut Option<oneshot::Receiver<()>>,
    ) -> (BTreeMap<u32, CheckOutcome>, bool) {
        let mut outcomes = BTreeMap::new();

        for provider in providers {
            let outcome = match shutdown_rx.as_mut() {
                Some(rx) => {
                    tokio::select! {
                        outcome = self.throttled_check(&target.ip, provider) => Some(outcome),
                        _ = rx => None,
                    }
                }
                None => Some(self.throttled_check(&target.ip, provider).await),
            };

            let Some(outcome) = outcome else {
                // Aborted mid-flight: no partial outcome for this pair.
                return (outcomes, true);
            };

            if let Err(e) = self
                .sink
                .record_outcome(&target.tag, provider.id, &outcome)
                .await
            {
                // Sink trouble degrades the stored data, never the run.
                warn!(
                    target = %target.tag,
                    provider = %provider.name,
                    error = %e,
                    "failed to record outcome"
                );
            }

            outcomes.insert(provider.id, outcome);
        }

        (outcomes, false)
    }

    /// Apply the provider's rate limit, run the check, and stamp the
    /// provider's completion time
    async fn throttled_check(&self, ip: &str, provider: &Provider) -> CheckOutcome {
        self.throttle(provider).await;
        let outcome = self.check_provider(ip, provider).await;

        // While this check was in flight another caller may have reserved a
        // later slot; the completion stamp must not roll that back.
        let mut last_check = self.last_check.lock().await;
        let now = Instant::now();
        let stamp = match last_check.get(&provider.id) {
            Some(&reserved) => reserved.max(now),
            None => now,
        };
        last_check.insert(provider.id, stamp);

        outcome
    }

    /// Sleep out the remainder of `provider`'s rate-limit window
    ///
    /// The slot is reserved before sleeping so concurrent callers checking
    /// the same provider queue up behind each other instead of stampeding.
    async fn throttle(&self, provider: &Provider) {
        if provider.rate_limit_ms == 0 {
            return;
        }
        let interval = Duration::from_millis(provider.rate_limit_ms);

        let wait = {
            let mut last_check = self.last_check.lock().await;
            let now = Instant::now();
            match last_check.get(&provider.id) {
                Some(&last) => {
                    let earliest = last + interval;
                    let wait = earliest.saturating_duration_since(now);
                    last_check.insert(provider.id, now.max(earliest));
                    wait
                }
                None => {
                    last_check.insert(provider.id, now);
                    Duration::ZERO
                }
            }
        };

        if !wait.is_zero() {
            debug!(
                provider = %provider.name,
                wait_ms = wait.as_millis() as u64,
                "rate limit: waiting"
            );
            tokio::time::sleep(wait).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::traits::resolver::Lookup;
    use async_trait::async_trait;
    use std::net::Ipv4Addr;

    /// Resolver that sleeps past any budget before answering
    struct LaggardResolver {
        delay: Duration,
    }

    #[async_trait]
    impl Resolver for LaggardResolver {
        async fn lookup_a(&self, name: &str, _timeout: Duration) -> Lookup {
            tokio::time::sleep(self.delay).await;
            Lookup::Found(vec![crate::traits::AnswerRecord {
                name: name.to_string(),
                ttl: 300,
                addr: Ipv4Addr::new(127, 0, 0, 2),
            }])
        }

        fn strategy(&self) -> &'static str {
            "laggard"
        }
    }

    fn engine_with(resolver: Box<dyn Resolver>) -> CheckEngine {
        CheckEngine::new(resolver, Box::new(MemorySink::new()), CheckConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn invalid_ip_short_circuits() {
        let engine = engine_with(Box::new(LaggardResolver {
            delay: Duration::ZERO,
        }));
        let provider = Provider::new(1, "Example", "bl.example.com");

        let outcome = engine.check_provider("not-an-ip", &provider).await;
        assert!(!outcome.listed);
        assert_eq!(outcome.error.as_deref(), Some("Invalid IP address"));
    }

    #[tokio::test]
    async fn ipv6_target_is_rejected_with_arpa_diagnostic() {
        let engine = engine_with(Box::new(LaggardResolver {
            delay: Duration::ZERO,
        }));
        let provider = Provider::new(1, "Example", "bl.example.com");

        let outcome = engine.check_provider("2001:db8::1", &provider).await;
        assert!(!outcome.listed);
        assert!(outcome.error.unwrap().contains("IPv6"));
        assert!(
            outcome
                .diagnostics
                .iter()
                .any(|d| d.contains("ip6.arpa")),
            "rejection should carry the computed arpa form"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_success_is_discarded_past_deadline() {
        // 5s budget + 1s grace; the resolver answers after 7s with a
        // perfectly valid listing, which must not be trusted.
        let engine = engine_with(Box::new(LaggardResolver {
            delay: Duration::from_secs(7),
        }));
        let provider = Provider::new(1, "Example", "bl.example.com");

        let outcome = engine.check_provider("1.2.3.4", &provider).await;
        assert!(!outcome.listed);
        assert_eq!(outcome.error.as_deref(), Some("Check exceeded timeout"));
    }

    #[tokio::test(start_paused = true)]
    async fn just_in_time_success_is_kept() {
        let engine = engine_with(Box::new(LaggardResolver {
            delay: Duration::from_secs(5),
        }));
        let provider = Provider::new(1, "Example", "bl.example.com");

        let outcome = engine.check_provider("1.2.3.4", &provider).await;
        assert!(outcome.listed, "5s is within the 5s + 1s grace window");
    }
}
