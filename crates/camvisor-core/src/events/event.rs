use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use camvisor_model::WorkerKind;

static SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of supervision events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    /// A worker (first launch or relaunch) is about to run.
    WorkerStarting,
    /// A worker's run ended; `reason` carries the outcome.
    WorkerExited,
    /// The policy asked for a relaunch after `delay`.
    RestartScheduled,
    /// The policy gave up on a worker.
    WorkerAbandoned,
    /// Operator interrupt received; no more restarts.
    ShutdownRequested,
    /// Every worker stopped within the grace period.
    AllStopped,
    /// Some workers had to be aborted after the grace period.
    GraceExceeded,
}

/// One supervision event.
#[derive(Clone, Debug)]
pub struct Event {
    /// Monotonic sequence number (process-wide).
    pub seq: u64,
    pub at: SystemTime,
    pub kind: EventKind,
    pub worker: Option<WorkerKind>,
    /// Liveness token of the worker run this event refers to.
    pub id: Option<u64>,
    /// Number of relaunches of this slot so far.
    pub attempt: Option<u64>,
    pub delay: Option<Duration>,
    pub reason: Option<String>,
}

impl Event {
    pub fn now(kind: EventKind) -> Self {
        Self {
            seq: SEQ.fetch_add(1, Ordering::Relaxed),
            at: SystemTime::now(),
            kind,
            worker: None,
            id: None,
            attempt: None,
            delay: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_worker(mut self, worker: &WorkerKind) -> Self {
        self.worker = Some(worker.clone());
        self
    }

    #[inline]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, attempt: u64) -> Self {
        self.attempt = Some(attempt);
        self
    }

    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let a = Event::now(EventKind::WorkerStarting);
        let b = Event::now(EventKind::WorkerExited);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_fill_fields() {
        let ev = Event::now(EventKind::RestartScheduled)
            .with_worker(&WorkerKind::camera("porch"))
            .with_id(7)
            .with_attempt(3)
            .with_delay(Duration::from_secs(1))
            .with_reason("exit code: 1");
        assert_eq!(ev.worker, Some(WorkerKind::camera("porch")));
        assert_eq!(ev.id, Some(7));
        assert_eq!(ev.attempt, Some(3));
        assert_eq!(ev.delay, Some(Duration::from_secs(1)));
        assert_eq!(ev.reason.as_deref(), Some("exit code: 1"));
    }
}
