//! ResultSink implementations
//!
//! Two sinks ship with the crate:
//! - [`MemorySink`]: volatile, for tests and embedders that keep their own
//!   persistence
//! - [`FileSink`]: JSON file with atomic writes and backup recovery
//!
//! Both apply upsert semantics: recording an outcome for a (target tag,
//! provider id) pair replaces whatever that pair held before, so each pair
//! always reflects its most recent check.

pub mod file;
pub mod memory;

pub use file::FileSink;
pub use memory::MemorySink;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::{CheckOutcome, RunId};

/// An outcome as held by a sink, stamped with its check time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOutcome {
    /// The recorded verdict
    pub outcome: CheckOutcome,

    /// When the outcome was recorded
    pub checked_at: DateTime<Utc>,
}

impl StoredOutcome {
    fn now(outcome: CheckOutcome) -> Self {
        Self {
            outcome,
            checked_at: Utc::now(),
        }
    }
}

/// A run record as held by a sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Sink-allocated run identity
    pub run_id: RunId,

    /// Tag of the owner the run was started for
    pub owner_tag: String,

    /// Number of targets the run was opened with
    pub target_count: usize,

    /// When the run was opened
    pub started_at: DateTime<Utc>,

    /// When the run was completed; `None` while in flight
    pub completed_at: Option<DateTime<Utc>>,

    /// Total provider checks attempted, filled at completion
    pub total_checks: usize,

    /// Targets listed by at least one provider, filled at completion
    pub listed_target_count: usize,
}

impl RunRecord {
    fn open(run_id: RunId, owner_tag: &str, target_count: usize) -> Self {
        Self {
            run_id,
            owner_tag: owner_tag.to_string(),
            target_count,
            started_at: Utc::now(),
            completed_at: None,
            total_checks: 0,
            listed_target_count: 0,
        }
    }

    fn complete(&mut self, total_checks: usize, listed_count: usize) {
        self.total_checks = total_checks;
        self.listed_target_count = listed_count;
        self.completed_at = Some(Utc::now());
    }
}
