//! Test doubles and common utilities for engine contract tests
//!
//! These doubles verify orchestration behavior (sequencing, rate limits,
//! accounting, resilience) without touching the network.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rbl_core::error::Error;
use rbl_core::outcome::{CheckOutcome, RunId};
use rbl_core::traits::{AnswerRecord, Lookup, Resolver, ResultSink};
use tokio::time::Instant;

/// Build a `Lookup::Found` carrying a single 127.0.0.x-style answer
pub fn found(name: &str, addr: [u8; 4]) -> Lookup {
    Lookup::Found(vec![AnswerRecord {
        name: name.to_string(),
        ttl: 300,
        addr: Ipv4Addr::from(addr),
    }])
}

/// A resolver scripted with per-name answers
///
/// Unscripted names answer `NotFound`. Every lookup is logged with its
/// query name and timestamp so tests can assert on ordering and spacing.
pub struct ScriptedResolver {
    answers: HashMap<String, Lookup>,
    /// Artificial latency applied to every lookup
    delay: Duration,
    /// (query name, when the lookup started)
    lookups: Arc<std::sync::Mutex<Vec<(String, Instant)>>>,
    lookup_count: Arc<AtomicUsize>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self {
            answers: HashMap::new(),
            delay: Duration::ZERO,
            lookups: Arc::new(std::sync::Mutex::new(Vec::new())),
            lookup_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script the answer for an exact query name
    pub fn with_answer(mut self, name: &str, lookup: Lookup) -> Self {
        self.answers.insert(name.to_string(), lookup);
        self
    }

    /// Apply an artificial latency to every lookup
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Get the number of lookups performed
    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::SeqCst)
    }

    /// Get the logged (query name, start time) pairs in order
    pub fn lookups(&self) -> Vec<(String, Instant)> {
        self.lookups.lock().unwrap().clone()
    }

    /// Create a resolver that shares the log and counters with `other`
    pub fn sharing_log_with(other: &Self) -> Self {
        Self {
            answers: other.answers.clone(),
            delay: other.delay,
            lookups: Arc::clone(&other.lookups),
            lookup_count: Arc::clone(&other.lookup_count),
        }
    }
}

#[async_trait::async_trait]
impl Resolver for ScriptedResolver {
    async fn lookup_a(&self, name: &str, _timeout: Duration) -> Lookup {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.lookups
            .lock()
            .unwrap()
            .push((name.to_string(), Instant::now()));

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.answers.get(name).cloned().unwrap_or(Lookup::NotFound)
    }

    fn strategy(&self) -> &'static str {
        "scripted"
    }
}

/// A ResultSink that tracks calls and optionally fails outcome writes
pub struct CountingSink {
    record_call_count: Arc<AtomicUsize>,
    start_call_count: Arc<AtomicUsize>,
    complete_call_count: Arc<AtomicUsize>,
    /// (target tag, provider id, outcome) in record order
    recorded: Arc<std::sync::Mutex<Vec<(String, u32, CheckOutcome)>>>,
    /// (run_id, total_checks, listed_count) per completion
    completions: Arc<std::sync::Mutex<Vec<(RunId, usize, usize)>>>,
    fail_records: bool,
    next_run_id: Arc<AtomicUsize>,
}

impl CountingSink {
    pub fn new() -> Self {
        Self {
            record_call_count: Arc::new(AtomicUsize::new(0)),
            start_call_count: Arc::new(AtomicUsize::new(0)),
            complete_call_count: Arc::new(AtomicUsize::new(0)),
            recorded: Arc::new(std::sync::Mutex::new(Vec::new())),
            completions: Arc::new(std::sync::Mutex::new(Vec::new())),
            fail_records: false,
            next_run_id: Arc::new(AtomicUsize::new(1)),
        }
    }

    /// Make every record_outcome() call fail
    pub fn failing_records(mut self) -> Self {
        self.fail_records = true;
        self
    }

    pub fn record_call_count(&self) -> usize {
        self.record_call_count.load(Ordering::SeqCst)
    }

    pub fn complete_call_count(&self) -> usize {
        self.complete_call_count.load(Ordering::SeqCst)
    }

    /// Get the recorded outcomes in order
    pub fn recorded(&self) -> Vec<(String, u32, CheckOutcome)> {
        self.recorded.lock().unwrap().clone()
    }

    /// Get the run completions in order
    pub fn completions(&self) -> Vec<(RunId, usize, usize)> {
        self.completions.lock().unwrap().clone()
    }

    /// Create a sink that shares counters and logs with `other`
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            record_call_count: Arc::clone(&other.record_call_count),
            start_call_count: Arc::clone(&other.start_call_count),
            complete_call_count: Arc::clone(&other.complete_call_count),
            recorded: Arc::clone(&other.recorded),
            completions: Arc::clone(&other.completions),
            fail_records: other.fail_records,
            next_run_id: Arc::clone(&other.next_run_id),
        }
    }
}

#[async_trait::async_trait]
impl ResultSink for CountingSink {
    async fn record_outcome(
        &self,
        target_tag: &str,
        provider_id: u32,
        outcome: &CheckOutcome,
    ) -> Result<(), Error> {
        self.record_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_records {
            return Err(Error::sink("simulated storage failure"));
        }
        self.recorded
            .lock()
            .unwrap()
            .push((target_tag.to_string(), provider_id, outcome.clone()));
        Ok(())
    }

    async fn start_run(&self, _owner_tag: &str, _target_count: usize) -> Result<RunId, Error> {
        self.start_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.next_run_id.fetch_add(1, Ordering::SeqCst) as RunId)
    }

    async fn complete_run(
        &self,
        run_id: RunId,
        total_checks: usize,
        listed_count: usize,
    ) -> Result<(), Error> {
        self.complete_call_count.fetch_add(1, Ordering::SeqCst);
        self.completions
            .lock()
            .unwrap()
            .push((run_id, total_checks, listed_count));
        Ok(())
    }
}
