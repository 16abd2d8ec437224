use std::path::PathBuf;

use thiserror::Error;

/// Errors of one housekeeping tick. None of them stops the worker.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StorageError {
    /// Free space could not be determined.
    #[error("free space probe failed: {reason}")]
    Probe { reason: String },

    /// Filesystem operation on `path` failed.
    #[error("io error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn probe(reason: impl Into<String>) -> Self {
        StorageError::Probe {
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            StorageError::Probe { .. } => "storage_probe",
            StorageError::Io { .. } => "storage_io",
        }
    }
}
