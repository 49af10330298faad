// Log lifecycle: local rotation -> local retention sweep -> archive upload
// -> remote retention sweep. Each step is independently retryable and a
// failing file or object never aborts the rest of its batch.

pub mod archive;
pub mod cycle;
pub mod handlers;
pub mod local;
pub mod remote;

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::storage::StorageError;

pub use cycle::{run_cycle, spawn_maintenance};

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("background task failed: {0}")]
    Task(String),
}

impl LifecycleError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        LifecycleError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl From<tokio::task::JoinError> for LifecycleError {
    fn from(e: tokio::task::JoinError) -> Self {
        LifecycleError::Task(e.to_string())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Outcome of a retention sweep over either tier. Under `dry_run`, `deleted`
/// lists what would have been removed.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    pub retention_days: u32,
    pub dry_run: bool,
    pub deleted: Vec<String>,
    pub retained: usize,
    pub bytes_freed: u64,
    pub failed: Vec<FileFailure>,
}

impl CleanupReport {
    pub fn new(retention_days: u32, dry_run: bool) -> Self {
        Self {
            retention_days,
            dry_run,
            deleted: Vec::new(),
            retained: 0,
            bytes_freed: 0,
            failed: Vec::new(),
        }
    }

    fn record_deleted(&mut self, name: String, size_bytes: u64) {
        self.deleted.push(name);
        self.bytes_freed += size_bytes;
    }
}
