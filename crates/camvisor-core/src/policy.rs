//! # Restart policies.
//!
//! A [`RestartPolicy`] decides what the supervisor does when a worker exits.
//! The supervisor loop never hardcodes the answer; it only applies the
//! returned [`RestartDecision`].
//!
//! - [`Always`] relaunches immediately, forever, whatever the outcome (default).
//! - [`Backoff`] relaunches forever with an exponentially growing delay.
//!
//! ```text
//! Exit{kind, outcome} ─► policy.decide(kind, outcome, restarts)
//!                          ├─ Restart{delay} ─► relaunch (worker sleeps `delay` first)
//!                          └─ GiveUp         ─► slot dropped, WorkerAbandoned
//! ```

use std::time::Duration;

use camvisor_model::WorkerKind;

use crate::supervisor::ExitOutcome;

/// What to do with a worker that just exited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartDecision {
    /// Relaunch the same worker after `delay` (zero = immediately).
    Restart { delay: Duration },
    /// Stop supervising this worker.
    GiveUp,
}

/// Policy consulted on every worker exit.
pub trait RestartPolicy: Send + Sync + 'static {
    /// `restarts` is the number of relaunches this slot already had.
    fn decide(&self, kind: &WorkerKind, outcome: &ExitOutcome, restarts: u64) -> RestartDecision;
}

/// Unconditional, unbounded, immediate restart.
#[derive(Clone, Copy, Debug, Default)]
pub struct Always;

impl RestartPolicy for Always {
    fn decide(&self, _kind: &WorkerKind, _outcome: &ExitOutcome, _restarts: u64) -> RestartDecision {
        RestartDecision::Restart {
            delay: Duration::ZERO,
        }
    }
}

/// Unbounded restart with exponential delay `first × factor^restarts`, capped at `max`.
#[derive(Clone, Copy, Debug)]
pub struct Backoff {
    pub first: Duration,
    pub max: Duration,
    pub factor: f64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            first: Duration::from_secs(1),
            max: Duration::from_secs(60),
            factor: 2.0,
        }
    }
}

impl Backoff {
    /// Delay before relaunch number `restarts` (0-indexed).
    pub fn delay(&self, restarts: u64) -> Duration {
        let exp = restarts.min(i32::MAX as u64) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl RestartPolicy for Backoff {
    fn decide(&self, _kind: &WorkerKind, _outcome: &ExitOutcome, restarts: u64) -> RestartDecision {
        RestartDecision::Restart {
            delay: self.delay(restarts),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_restarts_every_outcome_without_delay() {
        let outcomes = [
            ExitOutcome::Completed,
            ExitOutcome::Failed("exit code: 1".into()),
            ExitOutcome::Canceled,
            ExitOutcome::Panicked("boom".into()),
        ];
        for outcome in &outcomes {
            for restarts in [0, 1, 10_000, u64::MAX] {
                assert_eq!(
                    Always.decide(&WorkerKind::camera("a"), outcome, restarts),
                    RestartDecision::Restart {
                        delay: Duration::ZERO
                    }
                );
            }
        }
    }

    #[test]
    fn backoff_grows_and_caps() {
        let b = Backoff {
            first: Duration::from_millis(100),
            max: Duration::from_secs(1),
            factor: 2.0,
        };
        assert_eq!(b.delay(0), Duration::from_millis(100));
        assert_eq!(b.delay(1), Duration::from_millis(200));
        assert_eq!(b.delay(3), Duration::from_millis(800));
        assert_eq!(b.delay(4), Duration::from_secs(1));
        assert_eq!(b.delay(u64::MAX), Duration::from_secs(1));
    }

    #[test]
    fn backoff_never_gives_up() {
        let d = Backoff::default().decide(&WorkerKind::Reaper, &ExitOutcome::Completed, 500);
        assert_eq!(
            d,
            RestartDecision::Restart {
                delay: Duration::from_secs(60)
            }
        );
    }
}
