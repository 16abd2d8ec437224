//! # Supervisor: keeps exactly one live worker per registered kind.
//!
//! ```text
//! run(workers, shutdown):
//!   reject duplicate kinds ─► launch every worker (Registry::launch)
//!   loop {
//!     select! {
//!       shutdown  ─► break
//!       exit_rx   ─► Exit{id, kind, outcome}
//!                     ├─ Registry::take(id)            (stale id → ignored)
//!                     ├─ publish WorkerExited
//!                     └─ policy.decide(kind, outcome, restarts)
//!                          ├─ Restart{delay} ─► Registry::launch(same WorkerRef)
//!                          └─ GiveUp         ─► WorkerAbandoned
//!     }
//!   }
//!   publish ShutdownRequested ─► runtime_token.cancel() ─► join all within grace
//!                                                        ├─ Ok  ─► AllStopped
//!                                                        └─ Err ─► abort, GraceExceeded
//! ```
//!
//! ## Rules
//! - Exits are handled in the order the queue delivers them; nothing orders
//!   exits of different workers against each other.
//! - After shutdown is requested no exit is ever turned into a restart.
//! - A restarted worker is the very same [`WorkerRef`], so it carries the
//!   original parameters (camera name and url for recorders).

mod config;
mod outcome;
mod registry;

pub use config::SupervisorConfig;
pub use outcome::ExitOutcome;

use std::{collections::HashSet, future::Future, sync::Arc};

use camvisor_model::WorkerKind;
use tokio::{
    sync::{broadcast, mpsc},
    time,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    error::CoreError,
    events::{Bus, Event, EventKind},
    policy::{Always, RestartDecision, RestartPolicy},
    shutdown::wait_for_shutdown_signal,
    worker::WorkerRef,
};
use registry::{Exit, Registry};

const TARGET: &str = "camvisor.core.supervisor";

/// Summary of a clean shutdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Workers that were live when shutdown was requested, in launch order.
    pub stopped: Vec<WorkerKind>,
    /// Total relaunches performed during the run.
    pub restarts: u64,
}

/// Launches workers, restarts them when they exit, stops them on shutdown.
pub struct Supervisor {
    cfg: SupervisorConfig,
    bus: Bus,
    policy: Arc<dyn RestartPolicy>,
}

impl Supervisor {
    /// Creates a supervisor with the [`Always`] restart policy.
    pub fn new(cfg: SupervisorConfig) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        Self {
            cfg,
            bus,
            policy: Arc::new(Always),
        }
    }

    /// Replaces the restart policy.
    pub fn with_policy(mut self, policy: impl RestartPolicy) -> Self {
        self.policy = Arc::new(policy);
        self
    }

    /// Subscribes to supervision events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Runs `workers` until an OS termination signal arrives.
    pub async fn run_until_signal(
        &self,
        workers: Vec<WorkerRef>,
    ) -> Result<ShutdownReport, CoreError> {
        self.run(workers, wait_for_shutdown_signal()).await
    }

    /// Runs `workers` until `shutdown` completes.
    ///
    /// Returns `Ok` when every worker stopped within [`SupervisorConfig::grace`].
    /// If `shutdown` resolves to an error (signal listeners could not be
    /// installed) the workers are still stopped gracefully, then the error is returned.
    pub async fn run<F>(
        &self,
        workers: Vec<WorkerRef>,
        shutdown: F,
    ) -> Result<ShutdownReport, CoreError>
    where
        F: Future<Output = std::io::Result<()>>,
    {
        let mut seen = HashSet::new();
        for w in &workers {
            if !seen.insert(w.kind().clone()) {
                return Err(CoreError::DuplicateWorker(w.kind().clone()));
            }
        }

        let runtime = CancellationToken::new();
        let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
        let mut registry = Registry::new(runtime.clone(), exit_tx, self.bus.clone());

        for w in workers {
            registry.launch(w, 0, std::time::Duration::ZERO);
        }
        info!(target: TARGET, workers = registry.len(), kinds = ?registry.kinds(), "supervisor started");

        tokio::pin!(shutdown);
        let mut restarts = 0u64;
        let signal = loop {
            tokio::select! {
                biased;
                res = &mut shutdown => break res,
                Some(exit) = exit_rx.recv() => {
                    if self.handle_exit(&mut registry, exit) {
                        restarts += 1;
                    }
                }
            }
        };

        let report = self.stop_all(&mut registry, &runtime, restarts).await;
        match signal {
            Ok(()) => report,
            Err(e) => {
                error!(target: TARGET, error = %e, "shutdown signal listener failed");
                report?;
                Err(CoreError::Signal(e))
            }
        }
    }

    /// Applies the restart policy to one exit. Returns `true` if the worker was relaunched.
    fn handle_exit(&self, registry: &mut Registry, exit: Exit) -> bool {
        let Some(slot) = registry.take(exit.id) else {
            return false;
        };

        self.bus.publish(
            Event::now(EventKind::WorkerExited)
                .with_worker(&exit.kind)
                .with_id(exit.id)
                .with_attempt(slot.restarts)
                .with_reason(exit.outcome.to_string()),
        );
        match &exit.outcome {
            ExitOutcome::Panicked(reason) => {
                error!(target: TARGET, worker = %exit.kind, id = exit.id, %reason, "worker panicked")
            }
            outcome if outcome.is_abnormal() => {
                warn!(target: TARGET, worker = %exit.kind, id = exit.id, %outcome, "worker exited abnormally")
            }
            outcome => {
                info!(target: TARGET, worker = %exit.kind, id = exit.id, outcome = outcome.as_label(), "worker exited")
            }
        }

        match self.policy.decide(&slot.kind, &exit.outcome, slot.restarts) {
            RestartDecision::Restart { delay } => {
                let attempt = slot.restarts + 1;
                let id = registry.launch(slot.worker, attempt, delay);
                self.bus.publish(
                    Event::now(EventKind::RestartScheduled)
                        .with_worker(&slot.kind)
                        .with_id(id)
                        .with_attempt(attempt)
                        .with_delay(delay),
                );
                info!(target: TARGET, worker = %slot.kind, id, restarts = attempt, ?delay, "restarting worker");
                true
            }
            RestartDecision::GiveUp => {
                self.bus.publish(
                    Event::now(EventKind::WorkerAbandoned)
                        .with_worker(&slot.kind)
                        .with_attempt(slot.restarts),
                );
                warn!(target: TARGET, worker = %slot.kind, restarts = slot.restarts, "restart policy gave up on worker");
                false
            }
        }
    }

    /// Cancels every live worker and joins them within the grace period.
    async fn stop_all(
        &self,
        registry: &mut Registry,
        runtime: &CancellationToken,
        restarts: u64,
    ) -> Result<ShutdownReport, CoreError> {
        self.bus.publish(Event::now(EventKind::ShutdownRequested));
        info!(target: TARGET, live = registry.len(), "shutdown requested; stopping workers");
        runtime.cancel();

        let mut slots = registry.drain();
        let grace = self.cfg.grace;
        let joined = time::timeout(grace, async {
            for slot in slots.iter_mut() {
                let _ = (&mut slot.join).await;
            }
        })
        .await;

        let stopped: Vec<WorkerKind> = slots.iter().map(|s| s.kind.clone()).collect();
        if joined.is_ok() {
            self.bus.publish(Event::now(EventKind::AllStopped));
            info!(target: TARGET, stopped = stopped.len(), restarts, "all workers stopped");
            return Ok(ShutdownReport { stopped, restarts });
        }

        let stuck: Vec<WorkerKind> = slots
            .iter()
            .filter(|s| !s.join.is_finished())
            .map(|s| s.kind.clone())
            .collect();
        for slot in &slots {
            slot.join.abort();
        }
        self.bus.publish(
            Event::now(EventKind::GraceExceeded).with_reason(format!("stuck: {stuck:?}")),
        );
        error!(target: TARGET, ?grace, ?stuck, "workers did not stop within grace; aborted");
        Err(CoreError::GraceExceeded { grace, stuck })
    }
}
