//! Key and input loading
//!
//! Both files are read whole into a buffer sized exactly to the file's
//! reported length. Zero-length files are rejected before anything is
//! allocated, and a read that comes up short of the reported length fails
//! rather than returning a partially filled buffer.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use tracing::debug;
use xorcrypt_core::{FileRole, TransformError, TransformResult};

/// Immutable key bytes, never empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuffer(Vec<u8>);

impl KeyBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Input bytes, transformed in place by the workers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBuffer(Vec<u8>);

impl InputBuffer {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// Read the key file fully into memory.
pub fn load_key(path: &Path) -> TransformResult<KeyBuffer> {
    let bytes = read_exact_file(path, FileRole::Key)?;
    Ok(KeyBuffer(bytes))
}

/// Read the input file fully into memory.
pub fn load_input(path: &Path) -> TransformResult<InputBuffer> {
    let bytes = read_exact_file(path, FileRole::Input)?;
    Ok(InputBuffer(bytes))
}

fn read_exact_file(path: &Path, role: FileRole) -> TransformResult<Vec<u8>> {
    let file = File::open(path).map_err(|e| TransformError::io(role, path, e))?;
    let size = file
        .metadata()
        .map_err(|e| TransformError::io(role, path, e))?
        .len();

    if size == 0 {
        return Err(TransformError::EmptyFile {
            role,
            path: path.to_path_buf(),
        });
    }

    let buf = read_exact(file, size, role, path)?;
    debug!(role = %role, path = %path.display(), bytes = buf.len(), "file loaded");
    Ok(buf)
}

/// Read exactly `size` bytes from `reader` into a freshly reserved buffer.
///
/// `path` only labels errors.
fn read_exact(
    mut reader: impl Read,
    size: u64,
    role: FileRole,
    path: &Path,
) -> TransformResult<Vec<u8>> {
    let len = usize::try_from(size).map_err(|_| TransformError::Allocation { role, size })?;
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| TransformError::Allocation { role, size })?;
    buf.resize(len, 0);

    let filled = fill(&mut reader, &mut buf).map_err(|e| TransformError::io(role, path, e))?;
    if filled < len {
        return Err(TransformError::ShortRead {
            role,
            path: path.to_path_buf(),
            expected: size,
            actual: filled as u64,
        });
    }
    Ok(buf)
}

/// Read until `buf` is full or the reader reaches EOF; returns bytes read.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
