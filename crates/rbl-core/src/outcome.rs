//! Check results and run accounting
//!
//! `CheckOutcome` is the verdict for one (target, provider) pair;
//! `CheckRunSummary` is the aggregate over a whole batch run. Both are
//! created and fully populated inside a single engine invocation and handed
//! to the caller's `ResultSink` — the engine retains nothing across calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a check run, allocated by the ResultSink
pub type RunId = u64;

/// A candidate IP plus the caller's correlation tag
///
/// The tag is opaque to the engine; it only flows back out through the
/// ResultSink so the caller can tie outcomes to its own records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupTarget {
    /// Dotted-quad IPv4 address (validation happens at check time)
    pub ip: String,

    /// Caller-owned correlation tag (e.g., a storage row id)
    pub tag: String,
}

impl LookupTarget {
    /// Create a new lookup target
    pub fn new(ip: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            tag: tag.into(),
        }
    }
}

/// Verdict for a single (target, provider) check
///
/// Invariants: `listed == true` implies `error` is `None` and
/// `response_code` is `Some`; any `error` implies `listed == false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// True only for a valid listing response
    pub listed: bool,

    /// The literal returned address (e.g., "127.0.0.2") when listed
    pub response_code: Option<String>,

    /// Human-readable classification or transport failure, if any
    pub error: Option<String>,

    /// Ordered trace of the classification decision, for debugging
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl CheckOutcome {
    /// A valid listing with the returned response code
    pub fn listed(response_code: impl Into<String>, diagnostics: Vec<String>) -> Self {
        Self {
            listed: true,
            response_code: Some(response_code.into()),
            error: None,
            diagnostics,
        }
    }

    /// A clean (not listed) verdict with no error
    pub fn not_listed(diagnostics: Vec<String>) -> Self {
        Self {
            listed: false,
            response_code: None,
            error: None,
            diagnostics,
        }
    }

    /// A non-listed verdict carrying an error explanation
    pub fn failed(error: impl Into<String>, diagnostics: Vec<String>) -> Self {
        Self {
            listed: false,
            response_code: None,
            error: Some(error.into()),
            diagnostics,
        }
    }
}

/// Aggregate statistics for one batch run
///
/// Opened by the orchestrator before the first query and finalized exactly
/// once via [`CheckRunSummary::finalize`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRunSummary {
    /// Run identity allocated by the ResultSink
    pub run_id: RunId,

    /// Number of targets in the run
    pub total_targets: usize,

    /// Sum over all targets of provider checks actually attempted
    pub total_checks: usize,

    /// Targets with at least one listed outcome (each counts once)
    pub listed_target_count: usize,

    /// When the run was opened
    pub started_at: DateTime<Utc>,

    /// When the run was finalized; `None` while in flight
    pub completed_at: Option<DateTime<Utc>>,
}

impl CheckRunSummary {
    /// Open a summary for a run over `total_targets` targets
    pub fn open(run_id: RunId, total_targets: usize) -> Self {
        Self {
            run_id,
            total_targets,
            total_checks: 0,
            listed_target_count: 0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Stamp the completion time. Idempotent by construction: the engine
    /// calls this exactly once per run.
    pub(crate) fn finalize(&mut self) {
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_outcome_upholds_invariants() {
        let outcome = CheckOutcome::listed("127.0.0.2", vec!["final verdict: LISTED".into()]);
        assert!(outcome.listed);
        assert_eq!(outcome.response_code.as_deref(), Some("127.0.0.2"));
        assert!(outcome.error.is_none());
    }

    #[test]
    fn failed_outcome_is_never_listed() {
        let outcome = CheckOutcome::failed("DNS lookup timeout", vec![]);
        assert!(!outcome.listed);
        assert!(outcome.response_code.is_none());
        assert_eq!(outcome.error.as_deref(), Some("DNS lookup timeout"));
    }

    #[test]
    fn summary_finalizes_with_timestamp() {
        let mut summary = CheckRunSummary::open(42, 3);
        assert!(summary.completed_at.is_none());
        summary.finalize();
        assert!(summary.completed_at.is_some());
        assert!(summary.completed_at.unwrap() >= summary.started_at);
    }
}
