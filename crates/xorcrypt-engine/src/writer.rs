//! Output writing
//!
//! The destination is created if missing and truncated if present, then
//! written in place from offset 0. There is no temp-file-and-rename step:
//! a failed write can leave a truncated or partial file behind.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::info;
use xorcrypt_core::{FileRole, TransformError, TransformResult};

/// Open `path` for writing, creating it (mode 0644) or truncating it.
fn open_output(path: &Path) -> TransformResult<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }
    options
        .open(path)
        .map_err(|e| TransformError::io(FileRole::Output, path, e))
}

/// Write `bytes` to `path` in full. Returns the number of bytes written.
pub fn write_output(path: &Path, bytes: &[u8]) -> TransformResult<u64> {
    let mut file = open_output(path)?;
    file.write_all(bytes)
        .and_then(|()| file.flush())
        .map_err(|e| TransformError::io(FileRole::Output, path, e))?;

    info!(path = %path.display(), bytes = bytes.len(), "output file written");
    Ok(bytes.len() as u64)
}
