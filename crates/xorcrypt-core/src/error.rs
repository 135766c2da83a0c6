use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type TransformResult<T> = Result<T, TransformError>;

/// Errno values used by the privileged entry point (negated on return).
pub mod errno {
    pub const EIO: i64 = 5;
    pub const EAGAIN: i64 = 11;
    pub const ENOMEM: i64 = 12;
    pub const EFAULT: i64 = 14;
    pub const EINVAL: i64 = 22;
}

/// Which of the three files an I/O failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRole {
    Key,
    Input,
    Output,
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileRole::Key => "key",
            FileRole::Input => "input",
            FileRole::Output => "output",
        })
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("path resolution error: {0}")]
    PathResolution(String),

    #[error("{role} file I/O error ({}): {source}", .path.display())]
    Io {
        role: FileRole,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{role} file is empty: {}", .path.display())]
    EmptyFile { role: FileRole, path: PathBuf },

    #[error("cannot allocate {size} bytes for {role} buffer")]
    Allocation { role: FileRole, size: u64 },

    #[error("cannot allocate bookkeeping for {workers} workers")]
    WorkerAllocation { workers: usize },

    #[error("short read on {role} file ({}): expected {expected} bytes, got {actual}", .path.display())]
    ShortRead {
        role: FileRole,
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("failed to spawn worker {index}: {source}")]
    WorkerSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {index} panicked")]
    WorkerPanicked { index: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("config error: {0}")]
    Config(String),
}

impl TransformError {
    pub fn io(role: FileRole, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TransformError::Io {
            role,
            path: path.into(),
            source,
        }
    }

    /// Negative errno for the privileged entry point.
    ///
    /// OS errors keep their raw code when one is available; everything
    /// else maps onto the closest generic value.
    pub fn errno(&self) -> i64 {
        let code = match self {
            TransformError::PathResolution(_) => errno::EFAULT,
            TransformError::Io { source, .. } => source
                .raw_os_error()
                .map(i64::from)
                .unwrap_or(errno::EIO),
            TransformError::EmptyFile { .. } => errno::EINVAL,
            TransformError::Allocation { .. } | TransformError::WorkerAllocation { .. } => {
                errno::ENOMEM
            }
            TransformError::ShortRead { .. } => errno::EIO,
            TransformError::WorkerSpawn { source, .. } => source
                .raw_os_error()
                .map(i64::from)
                .unwrap_or(errno::EAGAIN),
            TransformError::WorkerPanicked { .. } => errno::EIO,
            TransformError::InvalidArgument(_) | TransformError::Config(_) => errno::EINVAL,
        };
        -code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn errno_is_negative_for_every_variant() {
        let errors = vec![
            TransformError::PathResolution("nul byte".into()),
            TransformError::io(FileRole::Input, "/x", io::Error::new(io::ErrorKind::Other, "x")),
            TransformError::EmptyFile {
                role: FileRole::Key,
                path: "/k".into(),
            },
            TransformError::Allocation {
                role: FileRole::Input,
                size: 1,
            },
            TransformError::ShortRead {
                role: FileRole::Input,
                path: "/i".into(),
                expected: 4,
                actual: 2,
            },
            TransformError::WorkerSpawn {
                index: 0,
                source: io::Error::new(io::ErrorKind::Other, "x"),
            },
            TransformError::WorkerPanicked { index: 3 },
            TransformError::WorkerAllocation { workers: 1 << 31 },
            TransformError::InvalidArgument("workers".into()),
        ];
        for e in errors {
            assert!(e.errno() < 0, "{e} must map to a negative code");
        }
    }

    #[test]
    fn io_error_keeps_os_code() {
        let e = TransformError::io(FileRole::Input, "/missing", io::Error::from_raw_os_error(2));
        assert_eq!(e.errno(), -2);
    }

    #[test]
    fn generic_codes() {
        assert_eq!(
            TransformError::InvalidArgument("0".into()).errno(),
            -errno::EINVAL
        );
        assert_eq!(
            TransformError::Allocation {
                role: FileRole::Key,
                size: 9
            }
            .errno(),
            -errno::ENOMEM
        );
        assert_eq!(
            TransformError::WorkerAllocation { workers: 7 }.errno(),
            -errno::ENOMEM
        );
        assert_eq!(
            TransformError::PathResolution("".into()).errno(),
            -errno::EFAULT
        );
    }

    #[test]
    fn display_names_the_file_role() {
        let e = TransformError::EmptyFile {
            role: FileRole::Key,
            path: "/tmp/key.bin".into(),
        };
        assert_eq!(e.to_string(), "key file is empty: /tmp/key.bin");
    }
}
