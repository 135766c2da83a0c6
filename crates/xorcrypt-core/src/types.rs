use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TransformError, TransformResult};

/// Number of concurrent workers for one transform; always at least one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u64")]
pub struct WorkerCount(NonZeroUsize);

impl WorkerCount {
    /// Validate a raw worker count as received from the caller.
    ///
    /// Zero and negative values are rejected with `InvalidArgument`.
    pub fn new(raw: i64) -> TransformResult<Self> {
        usize::try_from(raw)
            .ok()
            .and_then(NonZeroUsize::new)
            .map(WorkerCount)
            .ok_or_else(|| {
                TransformError::InvalidArgument(format!(
                    "worker count must be a positive integer, got {raw}"
                ))
            })
    }

    /// Worker count matching the machine's available parallelism
    pub fn available() -> Self {
        WorkerCount(std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN))
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl TryFrom<i64> for WorkerCount {
    type Error = TransformError;

    fn try_from(raw: i64) -> TransformResult<Self> {
        WorkerCount::new(raw)
    }
}

impl From<WorkerCount> for u64 {
    fn from(w: WorkerCount) -> u64 {
        w.get() as u64
    }
}

/// A single transform invocation: three files and a worker count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub key: PathBuf,
    pub workers: WorkerCount,
}

/// Per-worker accounting, reported in fragment order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerReport {
    pub index: usize,
    pub start: usize,
    pub end: usize,
    pub bytes: usize,
}

/// Result of a completed transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformOutcome {
    pub bytes_written: u64,
    pub key_len: usize,
    pub workers: Vec<WorkerReport>,
    /// Wall time spent between spawning the first worker and the barrier release
    pub transform_time: Duration,
}
