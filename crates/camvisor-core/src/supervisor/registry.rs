//! # Liveness registry.
//!
//! Maps the liveness token of each running worker (a monotonic id) to its
//! [`WorkerKind`] and original [`WorkerRef`]. Each launched worker reports its
//! own completion on the shared exit queue, tagged with that id.
//!
//! ```text
//! launch(worker) ─► id ─► tokio::spawn(run_slot)
//!                              ├─ [sleep delay, cancellable]
//!                              ├─ tokio::spawn(worker.run(child_token))   (panic isolation)
//!                              └─ exit_tx.send(Exit{id, kind, outcome})
//! ```

use std::collections::HashMap;
use std::time::Duration;

use camvisor_model::WorkerKind;
use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
    time,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    events::{Bus, Event, EventKind},
    supervisor::ExitOutcome,
    worker::WorkerRef,
};

/// Completion report of one worker run.
#[derive(Debug)]
pub(crate) struct Exit {
    pub id: u64,
    pub kind: WorkerKind,
    pub outcome: ExitOutcome,
}

/// A registered, running worker.
pub(crate) struct Slot {
    pub kind: WorkerKind,
    pub worker: WorkerRef,
    pub join: JoinHandle<()>,
    /// Relaunches that led to this run.
    pub restarts: u64,
}

pub(crate) struct Registry {
    slots: HashMap<u64, Slot>,
    next_id: u64,
    runtime: CancellationToken,
    exit_tx: mpsc::UnboundedSender<Exit>,
    bus: Bus,
}

impl Registry {
    pub fn new(runtime: CancellationToken, exit_tx: mpsc::UnboundedSender<Exit>, bus: Bus) -> Self {
        Self {
            slots: HashMap::new(),
            next_id: 1,
            runtime,
            exit_tx,
            bus,
        }
    }

    /// Spawns `worker` under a fresh liveness token and registers it.
    pub fn launch(&mut self, worker: WorkerRef, restarts: u64, delay: Duration) -> u64 {
        let id = self.next_id;
        self.next_id += 1;

        let kind = worker.kind().clone();
        let ctx = self.runtime.child_token();
        let join = tokio::spawn(run_slot(
            id,
            worker.clone(),
            ctx,
            delay,
            restarts,
            self.exit_tx.clone(),
            self.bus.clone(),
        ));

        self.slots.insert(
            id,
            Slot {
                kind,
                worker,
                join,
                restarts,
            },
        );
        id
    }

    /// Unregisters the slot behind `id`; `None` for unknown (stale) ids.
    pub fn take(&mut self, id: u64) -> Option<Slot> {
        self.slots.remove(&id)
    }

    pub fn drain(&mut self) -> Vec<Slot> {
        let mut slots: Vec<(u64, Slot)> = self.slots.drain().collect();
        slots.sort_unstable_by_key(|(id, _)| *id);
        slots.into_iter().map(|(_, slot)| slot).collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Sorted kinds of all live slots.
    pub fn kinds(&self) -> Vec<WorkerKind> {
        let mut kinds: Vec<WorkerKind> = self.slots.values().map(|s| s.kind.clone()).collect();
        kinds.sort();
        kinds
    }
}

/// Aborts the wrapped task when dropped.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn run_slot(
    id: u64,
    worker: WorkerRef,
    ctx: CancellationToken,
    delay: Duration,
    restarts: u64,
    exit_tx: mpsc::UnboundedSender<Exit>,
    bus: Bus,
) {
    let kind = worker.kind().clone();

    if !delay.is_zero() {
        debug!(target: "camvisor.core.supervisor", worker = %kind, ?delay, "delaying relaunch");
        tokio::select! {
            _ = time::sleep(delay) => {}
            _ = ctx.cancelled() => {
                let _ = exit_tx.send(Exit { id, kind, outcome: ExitOutcome::Canceled });
                return;
            }
        }
    }

    bus.publish(
        Event::now(EventKind::WorkerStarting)
            .with_worker(&kind)
            .with_id(id)
            .with_attempt(restarts),
    );
    info!(target: "camvisor.core.supervisor", worker = %kind, id, restarts, "worker starting");

    let inner = tokio::spawn(async move { worker.run(ctx).await });
    let _guard = AbortOnDrop(inner.abort_handle());
    let outcome = ExitOutcome::from_join(inner.await);

    let _ = exit_tx.send(Exit { id, kind, outcome });
}
