//! Transform worker pool and completion barrier
//!
//! One scoped OS thread per fragment. Each thread receives an exclusive
//! `&mut` sub-slice of the input buffer and a shared `&[u8]` view of the
//! key, so the only synchronization is the join at the end of the scope.
//!
//! If a worker cannot be spawned, no further workers are started, the ones
//! already running are joined, and the spawn error is returned.

use std::io;
use std::thread::{self, Scope, ScopedJoinHandle};

use tracing::{debug, error};
use xorcrypt_core::{TransformError, TransformResult, WorkerReport};

use crate::partition::{per_worker_vec, split_fragments, Fragment, FragmentSlice};

/// Starts one worker thread inside a scope.
///
/// The seam exists so callers can control thread construction (stack size,
/// naming) and so spawn failures can be exercised in tests.
pub trait WorkerSpawner {
    fn spawn<'scope, 'env, F, T>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        index: usize,
        f: F,
    ) -> io::Result<ScopedJoinHandle<'scope, T>>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope;
}

/// Spawns named `std::thread` workers
#[derive(Debug, Clone, Default)]
pub struct StdSpawner {
    pub stack_size: Option<usize>,
}

impl WorkerSpawner for StdSpawner {
    fn spawn<'scope, 'env, F, T>(
        &self,
        scope: &'scope Scope<'scope, 'env>,
        index: usize,
        f: F,
    ) -> io::Result<ScopedJoinHandle<'scope, T>>
    where
        F: FnOnce() -> T + Send + 'scope,
        T: Send + 'scope,
    {
        let mut builder = thread::Builder::new().name(format!("xor-worker-{index}"));
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }
        builder.spawn_scoped(scope, f)
    }
}

/// XOR `data` in place against the repeating key.
///
/// `offset` is the absolute position of `data[0]` in the input, so
/// `data[j] ^= key[(offset + j) % key.len()]`.
pub fn xor_fragment(data: &mut [u8], offset: usize, key: &[u8]) {
    if key.is_empty() {
        return;
    }
    let phase = offset % key.len();
    for (byte, k) in data.iter_mut().zip(key.iter().cycle().skip(phase)) {
        *byte ^= k;
    }
}

fn transform_fragment(slice: FragmentSlice<'_>, key: &[u8]) -> WorkerReport {
    let Fragment { index, start, end } = slice.fragment;
    debug!(worker = index, start, end, "worker started");

    xor_fragment(slice.data, start, key);

    debug!(worker = index, start, end, "worker completed");
    WorkerReport {
        index,
        start,
        end,
        bytes: end - start,
    }
}

/// Run one worker per fragment over `buffer` and wait for all of them.
///
/// `on_spawned` is called once every worker has been started, before the
/// barrier wait. Reports are returned in fragment order.
pub fn run_workers<S, F>(
    buffer: &mut [u8],
    key: &[u8],
    fragments: &[Fragment],
    spawner: &S,
    on_spawned: F,
) -> TransformResult<Vec<WorkerReport>>
where
    S: WorkerSpawner,
    F: FnOnce(),
{
    let slices = split_fragments(buffer, fragments)?;

    thread::scope(|scope| -> TransformResult<Vec<WorkerReport>> {
        // Bookkeeping is reserved up front so nothing is started that
        // could not be joined and reported.
        let mut handles = per_worker_vec(slices.len())?;
        let mut reports = per_worker_vec(slices.len())?;
        let mut spawn_error = None;

        for slice in slices {
            let index = slice.fragment.index;
            debug!(
                worker = index,
                start = slice.fragment.start,
                end = slice.fragment.end,
                "creating worker"
            );
            match spawner.spawn(scope, index, move || transform_fragment(slice, key)) {
                Ok(handle) => handles.push((index, handle)),
                Err(source) => {
                    error!(worker = index, "failed to create worker: {source}");
                    spawn_error = Some(TransformError::WorkerSpawn { index, source });
                    break;
                }
            }
        }

        if spawn_error.is_none() {
            on_spawned();
        }

        // Barrier: every started worker is joined, even after a spawn failure.
        let mut panicked = None;
        for (index, handle) in handles {
            debug!(worker = index, "waiting for worker to complete");
            match handle.join() {
                Ok(report) => reports.push(report),
                Err(_) => {
                    error!(worker = index, "worker panicked");
                    panicked.get_or_insert(index);
                }
            }
        }

        if let Some(err) = spawn_error {
            return Err(err);
        }
        if let Some(index) = panicked {
            return Err(TransformError::WorkerPanicked { index });
        }
        Ok(reports)
    })
}
