//! # Result Sink Trait
//!
//! Defines the interface for persisting check outcomes and run records.
//!
//! ## Implementations
//!
//! - In-memory: [`crate::sink::MemorySink`] (tests, embedding)
//! - Append-only JSONL journal: [`crate::sink::FileSink`]
//! - Callers typically supply their own (database rows, message queue, ...)
//!
//! ## Contract
//!
//! `record_outcome` has upsert semantics: the last outcome recorded for a
//! given (target tag, provider id) pair replaces any earlier one. A run is
//! opened with `start_run` before the first query and completed exactly once
//! with `complete_run`; sinks must tolerate a completion whose totals are
//! lower than `target_count * providers` (cancelled or partly failed runs).
//! Sinks must not inspect or second-guess outcomes — verdict logic is owned
//! by the engine.

use async_trait::async_trait;

use crate::outcome::{CheckOutcome, RunId};

/// Trait for outcome/run persistence implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Record (upsert) the outcome for one (target tag, provider id) pair
    async fn record_outcome(
        &self,
        target_tag: &str,
        provider_id: u32,
        outcome: &CheckOutcome,
    ) -> Result<(), crate::Error>;

    /// Open a run record and allocate its id
    ///
    /// # Parameters
    ///
    /// - `owner_tag`: caller-owned identity the run belongs to
    /// - `target_count`: number of targets the run will cover
    async fn start_run(&self, owner_tag: &str, target_count: usize) -> Result<RunId, crate::Error>;

    /// Finalize a run record with its accumulated totals
    async fn complete_run(
        &self,
        run_id: RunId,
        total_checks: usize,
        listed_count: usize,
    ) -> Result<(), crate::Error>;
}
