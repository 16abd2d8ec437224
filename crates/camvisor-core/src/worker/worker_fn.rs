use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use camvisor_model::WorkerKind;
use tokio_util::sync::CancellationToken;

use crate::{error::WorkerError, worker::Worker};

/// Closure-backed worker.
///
/// Wraps `F: Fn(CancellationToken) -> Fut`, producing a fresh future per run.
/// Shared state between runs must be explicit (`Arc<...>` captured by the closure).
pub struct WorkerFn<F> {
    kind: WorkerKind,
    f: F,
}

impl<F, Fut> WorkerFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    pub fn new(kind: WorkerKind, f: F) -> Self {
        Self { kind, f }
    }

    pub fn arc(kind: WorkerKind, f: F) -> Arc<Self> {
        Arc::new(Self::new(kind, f))
    }
}

#[async_trait]
impl<F, Fut> Worker for WorkerFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), WorkerError>> + Send + 'static,
{
    fn kind(&self) -> &WorkerKind {
        &self.kind
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkerError> {
        (self.f)(ctx).await
    }
}
