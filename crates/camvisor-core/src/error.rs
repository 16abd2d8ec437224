//! Error types of the supervision runtime and of individual workers.

use std::time::Duration;

use camvisor_model::WorkerKind;
use thiserror::Error;

/// Errors produced by the supervisor itself.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CoreError {
    /// Two workers were registered under the same identity.
    #[error("worker {0} registered twice")]
    DuplicateWorker(WorkerKind),

    /// Shutdown grace period was exceeded; the listed workers were aborted.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        grace: Duration,
        stuck: Vec<WorkerKind>,
    },

    /// OS signal listeners could not be installed.
    #[error("signal handling: {0}")]
    Signal(#[from] std::io::Error),
}

impl CoreError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            CoreError::DuplicateWorker(_) => "core_duplicate_worker",
            CoreError::GraceExceeded { .. } => "core_grace_exceeded",
            CoreError::Signal(_) => "core_signal",
        }
    }
}

/// Errors returned by one run of a worker.
///
/// Every variant is recoverable from the supervisor's point of view: the
/// restart policy decides what happens next.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum WorkerError {
    /// The run ended abnormally (encoder crash, probe failure, ...).
    #[error("worker failed: {reason}")]
    Fail { reason: String },

    /// The run stopped because its cancellation token fired.
    #[error("worker cancelled")]
    Canceled,
}

impl WorkerError {
    pub fn fail(reason: impl Into<String>) -> Self {
        WorkerError::Fail {
            reason: reason.into(),
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            WorkerError::Fail { .. } => "worker_failed",
            WorkerError::Canceled => "worker_canceled",
        }
    }
}
