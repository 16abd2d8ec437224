use std::fmt;

use tokio::task::JoinError;

use crate::error::WorkerError;

/// How one run of a worker ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExitOutcome {
    /// `run` returned `Ok(())`.
    Completed,
    /// `run` returned an error other than cancellation.
    Failed(String),
    /// `run` observed its cancellation token.
    Canceled,
    /// `run` panicked (or its task was aborted).
    Panicked(String),
}

impl ExitOutcome {
    pub(crate) fn from_join(res: Result<Result<(), WorkerError>, JoinError>) -> Self {
        match res {
            Ok(Ok(())) => ExitOutcome::Completed,
            Ok(Err(WorkerError::Canceled)) => ExitOutcome::Canceled,
            Ok(Err(e)) => ExitOutcome::Failed(e.to_string()),
            Err(je) if je.is_panic() => ExitOutcome::Panicked(panic_message(je)),
            Err(je) => ExitOutcome::Panicked(je.to_string()),
        }
    }

    pub fn as_label(&self) -> &'static str {
        match self {
            ExitOutcome::Completed => "completed",
            ExitOutcome::Failed(_) => "failed",
            ExitOutcome::Canceled => "canceled",
            ExitOutcome::Panicked(_) => "panicked",
        }
    }

    /// `true` for exits that point at a problem (failure or panic).
    pub fn is_abnormal(&self) -> bool {
        matches!(self, ExitOutcome::Failed(_) | ExitOutcome::Panicked(_))
    }
}

impl fmt::Display for ExitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitOutcome::Failed(reason) | ExitOutcome::Panicked(reason) => {
                write!(f, "{}: {reason}", self.as_label())
            }
            other => f.write_str(other.as_label()),
        }
    }
}

fn panic_message(je: JoinError) -> String {
    let payload = je.into_panic();
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
