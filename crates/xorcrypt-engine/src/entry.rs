//! Privileged entry points
//!
//! `encrypt`, `decrypt` and `transform` take raw caller arguments and
//! return the number of bytes written, or a negative errno on failure.
//! Encryption and decryption are the same operation; the two names only
//! differ in how the call is logged.

use std::path::PathBuf;

use tracing::info;
use xorcrypt_core::{TransformError, TransformRequest, TransformResult, WorkerCount};

use crate::orchestrator::Transformer;

/// Longest accepted path, including the terminating byte the caller would pass
const PATH_MAX: usize = 4096;

/// Encrypt `input_path` into `output_path` with the key at `key_path`.
pub fn encrypt(input_path: &str, output_path: &str, key_path: &str, worker_count: i32) -> i64 {
    dispatch("encrypt", input_path, output_path, key_path, worker_count)
}

/// Decrypt `input_path` into `output_path` with the key at `key_path`.
pub fn decrypt(input_path: &str, output_path: &str, key_path: &str, worker_count: i32) -> i64 {
    dispatch("decrypt", input_path, output_path, key_path, worker_count)
}

/// Direction-agnostic form of [`encrypt`] / [`decrypt`].
pub fn transform(input_path: &str, output_path: &str, key_path: &str, worker_count: i32) -> i64 {
    dispatch("transform", input_path, output_path, key_path, worker_count)
}

fn dispatch(
    operation: &str,
    input_path: &str,
    output_path: &str,
    key_path: &str,
    worker_count: i32,
) -> i64 {
    info!(operation, "entering privileged transform");

    let result = build_request(input_path, output_path, key_path, worker_count)
        .and_then(|request| Transformer::default().transform(&request));

    match result {
        Ok(outcome) => i64::try_from(outcome.bytes_written).unwrap_or(i64::MAX),
        Err(e) => e.errno(),
    }
}

/// Validate raw caller arguments into a request without touching any file.
pub fn build_request(
    input_path: &str,
    output_path: &str,
    key_path: &str,
    worker_count: i32,
) -> TransformResult<TransformRequest> {
    Ok(TransformRequest {
        input: resolve_path("input", input_path)?,
        output: resolve_path("output", output_path)?,
        key: resolve_path("key", key_path)?,
        workers: WorkerCount::new(i64::from(worker_count))?,
    })
}

fn resolve_path(what: &str, raw: &str) -> TransformResult<PathBuf> {
    if raw.is_empty() {
        return Err(TransformError::PathResolution(format!("{what} path is empty")));
    }
    if raw.contains('\0') {
        return Err(TransformError::PathResolution(format!(
            "{what} path contains a NUL byte"
        )));
    }
    if raw.len() >= PATH_MAX {
        return Err(TransformError::PathResolution(format!(
            "{what} path exceeds {PATH_MAX} bytes"
        )));
    }
    Ok(PathBuf::from(raw))
}
