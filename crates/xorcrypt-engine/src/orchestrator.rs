//! Transform orchestration
//!
//! Stages: `Idle → KeyLoaded → InputLoaded → Partitioned → Running → Completed`,
//! with `Failed` reachable from any of them. Every resource a stage acquires
//! (file handle, buffer, worker thread) is owned by a scope that ends before
//! `transform` returns, so an early `?` releases exactly what was acquired.
//!
//! The output file is not opened until every worker has been joined: a
//! failure before that point never creates or truncates the destination.

use std::fmt;
use std::time::Instant;

use tracing::{debug, error, info};
use xorcrypt_core::{TransformOutcome, TransformRequest, TransformResult};

use crate::loader::{load_input, load_key};
use crate::partition::partition;
use crate::pool::{run_workers, StdSpawner, WorkerSpawner};
use crate::writer::write_output;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStage {
    Idle,
    KeyLoaded,
    InputLoaded,
    Partitioned,
    Running,
    Completed,
    Failed,
}

impl fmt::Display for TransformStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransformStage::Idle => "idle",
            TransformStage::KeyLoaded => "key-loaded",
            TransformStage::InputLoaded => "input-loaded",
            TransformStage::Partitioned => "partitioned",
            TransformStage::Running => "running",
            TransformStage::Completed => "completed",
            TransformStage::Failed => "failed",
        })
    }
}

/// Tracks the current stage and logs each transition
#[derive(Debug)]
struct StageTracker {
    current: TransformStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: TransformStage::Idle,
        }
    }

    fn advance(&mut self, next: TransformStage) {
        debug!(from = %self.current, to = %next, "stage transition");
        self.current = next;
    }
}

/// Engine-wide knobs that do not vary per request
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Worker thread stack size in bytes (None = platform default)
    pub worker_stack_size: Option<usize>,
}

/// Runs transform requests. Holds no per-request state; each call builds
/// its own buffers and worker threads.
#[derive(Debug, Clone)]
pub struct Transformer<S = StdSpawner> {
    spawner: S,
}

impl Transformer<StdSpawner> {
    pub fn new(options: EngineOptions) -> Self {
        Self {
            spawner: StdSpawner {
                stack_size: options.worker_stack_size,
            },
        }
    }
}

impl Default for Transformer<StdSpawner> {
    fn default() -> Self {
        Self::new(EngineOptions::default())
    }
}

impl<S: WorkerSpawner> Transformer<S> {
    pub fn with_spawner(spawner: S) -> Self {
        Self { spawner }
    }

    /// Transform `request.input` into `request.output` with the repeating key.
    pub fn transform(&self, request: &TransformRequest) -> TransformResult<TransformOutcome> {
        info!(
            input = %request.input.display(),
            output = %request.output.display(),
            key = %request.key.display(),
            workers = request.workers.get(),
            "transform starting"
        );

        let mut stages = StageTracker::new();
        let result = self.run(request, &mut stages);

        match &result {
            Ok(outcome) => info!(
                bytes = outcome.bytes_written,
                workers = outcome.workers.len(),
                elapsed_ms = outcome.transform_time.as_millis() as u64,
                "transform completed"
            ),
            Err(e) => {
                error!(stage = %stages.current, "transform failed: {e}");
                stages.advance(TransformStage::Failed);
            }
        }
        result
    }

    fn run(
        &self,
        request: &TransformRequest,
        stages: &mut StageTracker,
    ) -> TransformResult<TransformOutcome> {
        let key = load_key(&request.key)?;
        stages.advance(TransformStage::KeyLoaded);

        let mut input = load_input(&request.input)?;
        stages.advance(TransformStage::InputLoaded);

        let fragments = partition(input.as_bytes().len(), request.workers)?;
        stages.advance(TransformStage::Partitioned);

        let started = Instant::now();
        let workers = run_workers(
            input.as_mut_slice(),
            key.as_bytes(),
            &fragments,
            &self.spawner,
            || stages.advance(TransformStage::Running),
        )?;
        let transform_time = started.elapsed();

        let bytes_written = write_output(&request.output, input.as_bytes())?;
        stages.advance(TransformStage::Completed);

        Ok(TransformOutcome {
            bytes_written,
            key_len: key.as_bytes().len(),
            workers,
            transform_time,
        })
    }
}
