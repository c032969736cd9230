// # Memory Result Sink
//
// In-memory implementation of ResultSink.
//
// ## Purpose
//
// Holds outcomes and run records in process memory with no persistence.
// Useful for tests, one-shot CLI invocations, and embedders that mirror
// results into their own storage.
//
// ## Crash Behavior
//
// - All outcomes and run records are lost on restart/crash
// - Run ids restart from 1, so ids are only unique within one process

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::Error;
use crate::outcome::{CheckOutcome, RunId};
use crate::sink::{RunRecord, StoredOutcome};
use crate::traits::ResultSink;

/// In-memory result sink
///
/// Outcomes live in a HashMap keyed by (target tag, provider id) behind a
/// RwLock; recording for an existing pair replaces the previous outcome.
///
/// # Example
///
/// ```rust,no_run
/// use rbl_core::sink::MemorySink;
/// use rbl_core::traits::ResultSink;
/// use rbl_core::CheckOutcome;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = MemorySink::new();
///
///     let run_id = sink.start_run("site-7", 1).await?;
///     let outcome = CheckOutcome::not_listed(vec![]);
///     sink.record_outcome("site-7", 3, &outcome).await?;
///     sink.complete_run(run_id, 1, 0).await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemorySink {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    outcomes: HashMap<(String, u32), StoredOutcome>,
    runs: HashMap<RunId, RunRecord>,
    next_run_id: RunId,
}

impl MemorySink {
    /// Create a new empty memory sink
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryState {
                outcomes: HashMap::new(),
                runs: HashMap::new(),
                next_run_id: 1,
            })),
        }
    }

    /// Get the stored outcome for a (target tag, provider id) pair
    pub async fn outcome(&self, target_tag: &str, provider_id: u32) -> Option<StoredOutcome> {
        let guard = self.inner.read().await;
        guard
            .outcomes
            .get(&(target_tag.to_string(), provider_id))
            .cloned()
    }

    /// Get all stored outcomes for a target tag, keyed by provider id
    pub async fn outcomes_for(&self, target_tag: &str) -> HashMap<u32, StoredOutcome> {
        let guard = self.inner.read().await;
        guard
            .outcomes
            .iter()
            .filter(|((tag, _), _)| tag == target_tag)
            .map(|((_, provider_id), stored)| (*provider_id, stored.clone()))
            .collect()
    }

    /// Get a run record by id
    pub async fn run(&self, run_id: RunId) -> Option<RunRecord> {
        let guard = self.inner.read().await;
        guard.runs.get(&run_id).cloned()
    }

    /// Number of stored (target, provider) outcomes
    pub async fn len(&self) -> usize {
        self.inner.read().await.outcomes.len()
    }

    /// Check if the sink holds no outcomes
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.outcomes.is_empty()
    }

    /// Drop all outcomes and run records
    pub async fn clear(&self) {
        let mut guard = self.inner.write().await;
        guard.outcomes.clear();
        guard.runs.clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResultSink for MemorySink {
    async fn record_outcome(
        &self,
        target_tag: &str,
        provider_id: u32,
        outcome: &CheckOutcome,
    ) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.outcomes.insert(
            (target_tag.to_string(), provider_id),
            StoredOutcome::now(outcome.clone()),
        );
        Ok(())
    }

    async fn start_run(&self, owner_tag: &str, target_count: usize) -> Result<RunId, Error> {
        let mut guard = self.inner.write().await;
        let run_id = guard.next_run_id;
        guard.next_run_id += 1;
        guard
            .runs
            .insert(run_id, RunRecord::open(run_id, owner_tag, target_count));
        Ok(run_id)
    }

    async fn complete_run(
        &self,
        run_id: RunId,
        total_checks: usize,
        listed_count: usize,
    ) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        let record = guard
            .runs
            .get_mut(&run_id)
            .ok_or_else(|| Error::sink(format!("unknown run id {}", run_id)))?;
        record.complete(total_checks, listed_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_upsert() {
        let sink = MemorySink::new();
        assert!(sink.is_empty().await);

        let first = CheckOutcome::listed("127.0.0.2", vec![]);
        sink.record_outcome("site-1", 3, &first).await.unwrap();
        assert_eq!(sink.len().await, 1);

        // Re-recording the same pair replaces, never duplicates
        let second = CheckOutcome::not_listed(vec![]);
        sink.record_outcome("site-1", 3, &second).await.unwrap();
        assert_eq!(sink.len().await, 1);

        let stored = sink.outcome("site-1", 3).await.unwrap();
        assert!(!stored.outcome.listed);
    }

    #[tokio::test]
    async fn test_memory_sink_run_lifecycle() {
        let sink = MemorySink::new();

        let run_id = sink.start_run("site-1", 2).await.unwrap();
        let record = sink.run(run_id).await.unwrap();
        assert_eq!(record.owner_tag, "site-1");
        assert_eq!(record.target_count, 2);
        assert!(record.completed_at.is_none());

        sink.complete_run(run_id, 52, 1).await.unwrap();
        let record = sink.run(run_id).await.unwrap();
        assert_eq!(record.total_checks, 52);
        assert_eq!(record.listed_target_count, 1);
        assert!(record.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_memory_sink_run_ids_increment() {
        let sink = MemorySink::new();
        let a = sink.start_run("x", 0).await.unwrap();
        let b = sink.start_run("y", 0).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_complete_unknown_run_errors() {
        let sink = MemorySink::new();
        assert!(sink.complete_run(999, 0, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_outcomes_for_tag() {
        let sink = MemorySink::new();
        let outcome = CheckOutcome::not_listed(vec![]);
        sink.record_outcome("site-1", 1, &outcome).await.unwrap();
        sink.record_outcome("site-1", 2, &outcome).await.unwrap();
        sink.record_outcome("site-2", 1, &outcome).await.unwrap();

        let for_one = sink.outcomes_for("site-1").await;
        assert_eq!(for_one.len(), 2);
        assert!(for_one.contains_key(&1));
        assert!(for_one.contains_key(&2));
    }
}
