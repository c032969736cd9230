// # File Result Sink
//
// File-based implementation of ResultSink with crash recovery.
//
// ## Purpose
//
// Persists outcomes and run records across restarts so listing history
// survives the process. One JSON document holds everything.
//
// ## Crash Recovery
//
// - Atomic writes: new document written to a temp file, then renamed
// - Automatic backup: keeps .backup of the last known good document
// - Corruption detection: JSON validation on load, falls back to backup
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "next_run_id": 3,
//   "runs": {
//     "2": {
//       "run_id": 2,
//       "owner_tag": "site-7",
//       "target_count": 2,
//       "started_at": "2026-08-30T12:00:00Z",
//       "completed_at": "2026-08-30T12:00:41Z",
//       "total_checks": 52,
//       "listed_target_count": 1
//     }
//   },
//   "outcomes": {
//     "site-7": {
//       "4": {
//         "outcome": { "listed": true, "response_code": "127.0.0.2", "error": null },
//         "checked_at": "2026-08-30T12:00:05Z"
//       }
//     }
//   }
// }
// ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::outcome::{CheckOutcome, RunId};
use crate::sink::{RunRecord, StoredOutcome};
use crate::traits::ResultSink;

/// Result file format version, kept for future migration
const RESULT_FILE_VERSION: &str = "1.0";

/// File-based result sink with crash recovery
///
/// Every mutation is written through to disk immediately. Writes are
/// atomic (temp file + rename) and the previous good document is kept in
/// a `.backup` file that the loader falls back to on corruption.
///
/// # Example
///
/// ```rust,no_run
/// use rbl_core::sink::FileSink;
/// use rbl_core::traits::ResultSink;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sink = FileSink::new("/var/lib/rbl-watch/results.json").await?;
///     let run_id = sink.start_run("site-7", 2).await?;
///     sink.complete_run(run_id, 52, 0).await?;
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    state: Arc<RwLock<ResultDocument>>,
}

/// Serializable result document
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct ResultDocument {
    version: String,
    next_run_id: RunId,
    runs: HashMap<RunId, RunRecord>,
    /// target tag -> provider id -> latest outcome
    outcomes: HashMap<String, HashMap<u32, StoredOutcome>>,
}

impl ResultDocument {
    fn empty() -> Self {
        Self {
            version: RESULT_FILE_VERSION.to_string(),
            next_run_id: 1,
            runs: HashMap::new(),
            outcomes: HashMap::new(),
        }
    }
}

impl FileSink {
    /// Create or load a file sink
    ///
    /// Loads the existing document if present, recovering from the backup
    /// on corruption, and creates parent directories as needed.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    Error::config(format!(
                        "Failed to create result directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let document = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(document)),
        })
    }

    /// Get the stored outcome for a (target tag, provider id) pair
    pub async fn outcome(&self, target_tag: &str, provider_id: u32) -> Option<StoredOutcome> {
        let guard = self.state.read().await;
        guard
            .outcomes
            .get(target_tag)
            .and_then(|by_provider| by_provider.get(&provider_id))
            .cloned()
    }

    /// Get all stored outcomes for a target tag, keyed by provider id
    pub async fn outcomes_for(&self, target_tag: &str) -> HashMap<u32, StoredOutcome> {
        let guard = self.state.read().await;
        guard.outcomes.get(target_tag).cloned().unwrap_or_default()
    }

    /// Get a run record by id
    pub async fn run(&self, run_id: RunId) -> Option<RunRecord> {
        let guard = self.state.read().await;
        guard.runs.get(&run_id).cloned()
    }

    /// Load the document with automatic backup recovery
    async fn load_with_recovery(path: &Path) -> Result<ResultDocument, Error> {
        match Self::load_document(path).await {
            Ok(document) => {
                tracing::debug!(
                    runs = document.runs.len(),
                    targets = document.outcomes.len(),
                    "loaded result file"
                );
                Ok(document)
            }
            Err(e) if e.to_string().to_lowercase().contains("parse") => {
                tracing::warn!(
                    "result file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if backup_path.exists() {
                    match Self::load_document(&backup_path).await {
                        Ok(document) => {
                            tracing::info!(
                                runs = document.runs.len(),
                                "recovered result file from backup"
                            );
                            Ok(document)
                        }
                        Err(backup_err) => {
                            tracing::error!(
                                "backup also corrupted: {}. Starting with empty document.",
                                backup_err
                            );
                            Ok(ResultDocument::empty())
                        }
                    }
                } else {
                    tracing::warn!("no backup file found, starting with empty document");
                    Ok(ResultDocument::empty())
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load_document(path: &Path) -> Result<ResultDocument, Error> {
        if !path.exists() {
            tracing::debug!("result file does not exist: {}", path.display());
            return Ok(ResultDocument::empty());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::sink(format!(
                "Failed to read result file {}: {}",
                path.display(),
                e
            ))
        })?;

        let document: ResultDocument = serde_json::from_str(&content).map_err(|e| {
            Error::sink(format!(
                "Failed to parse result file {}: {}",
                path.display(),
                e
            ))
        })?;

        if document.version != RESULT_FILE_VERSION {
            tracing::warn!(
                "result file version mismatch: expected {}, got {}. Attempting to load anyway.",
                RESULT_FILE_VERSION,
                document.version
            );
        }

        Ok(document)
    }

    /// Write the document to file atomically
    async fn write_document(&self) -> Result<(), Error> {
        let json = {
            let guard = self.state.read().await;
            serde_json::to_string_pretty(&*guard)
                .map_err(|e| Error::sink(format!("Failed to serialize results: {}", e)))?
        };

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::sink(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::sink(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.flush().await.map_err(|e| {
                Error::sink(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the previous good document around before replacing it.
        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("failed to create result backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::sink(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("results written to {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl ResultSink for FileSink {
    async fn record_outcome(
        &self,
        target_tag: &str,
        provider_id: u32,
        outcome: &CheckOutcome,
    ) -> Result<(), Error> {
        {
            let mut guard = self.state.write().await;
            guard
                .outcomes
                .entry(target_tag.to_string())
                .or_default()
                .insert(provider_id, StoredOutcome::now(outcome.clone()));
        }

        self.write_document().await
    }

    async fn start_run(&self, owner_tag: &str, target_count: usize) -> Result<RunId, Error> {
        let run_id = {
            let mut guard = self.state.write().await;
            let run_id = guard.next_run_id;
            guard.next_run_id += 1;
            guard
                .runs
                .insert(run_id, RunRecord::open(run_id, owner_tag, target_count));
            run_id
        };

        self.write_document().await?;
        Ok(run_id)
    }

    async fn complete_run(
        &self,
        run_id: RunId,
        total_checks: usize,
        listed_count: usize,
    ) -> Result<(), Error> {
        {
            let mut guard = self.state.write().await;
            let record = guard
                .runs
                .get_mut(&run_id)
                .ok_or_else(|| Error::sink(format!("unknown run id {}", run_id)))?;
            record.complete(total_checks, listed_count);
        }

        self.write_document().await
    }
}
