//! # Worker abstraction.
//!
//! A [`Worker`] is one supervised unit: a camera recorder, the disk reaper or
//! the folder roller. It owns its parameters; every call to [`Worker::run`] is
//! a fresh execution with those same parameters, which is how a restart
//! reproduces the original worker exactly.
//!
//! Implementations must watch the [`CancellationToken`] and return promptly
//! (usually `Err(WorkerError::Canceled)`) once it fires.

mod worker_fn;
pub use worker_fn::WorkerFn;

use std::sync::Arc;

use async_trait::async_trait;
use camvisor_model::WorkerKind;
use tokio_util::sync::CancellationToken;

use crate::error::WorkerError;

/// Shared handle to a worker.
pub type WorkerRef = Arc<dyn Worker>;

/// # Long-lived, cancelable unit of work.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// Stable identity of this worker.
    fn kind(&self) -> &WorkerKind;

    /// Runs until the work ends on its own or `ctx` is cancelled.
    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkerError>;
}
