//! # camvisor-core
//!
//! Supervision runtime of the recorder: launches one worker per registered
//! [`WorkerKind`](camvisor_model::WorkerKind), waits on a single completion
//! queue, and relaunches whichever worker exits with its original parameters.
//!
//! ```text
//!   WorkerRef ─┐                        ┌─► Exit{id, kind, outcome} ─┐
//!   WorkerRef ─┼─► Supervisor::run ─► spawn ─► Exit{...}            ├─► mpsc ─► run loop
//!   WorkerRef ─┘                        └─► Exit{...} ───────────────┘      │
//!                                                                           ├─ RestartPolicy::decide
//!                                                                           └─ relaunch same WorkerRef
//! ```
//!
//! On shutdown the runtime token is cancelled, each worker observes its child
//! token, and the supervisor joins all of them within a grace period.

mod error;
mod events;
mod policy;
mod shutdown;
mod supervisor;
mod worker;

pub use error::{CoreError, WorkerError};
pub use events::{Bus, Event, EventKind};
pub use policy::{Always, Backoff, RestartDecision, RestartPolicy};
pub use shutdown::wait_for_shutdown_signal;
pub use supervisor::{ExitOutcome, ShutdownReport, Supervisor, SupervisorConfig};
pub use worker::{Worker, WorkerFn, WorkerRef};
