use thiserror::Error;

/// Errors raised while preparing or probing the encoder.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("program {program:?} not found or not executable: {reason}")]
    MissingProgram { program: String, reason: String },
    #[error("non-zero exit code: {code}")]
    NonZeroExit { code: i32 },
    #[error("killed by signal")]
    KilledBySignal,
}

pub type ExecResult<T> = Result<T, ExecError>;

impl ExecError {
    pub fn as_label(&self) -> &'static str {
        match self {
            ExecError::MissingProgram { .. } => "exec_missing_program",
            ExecError::NonZeroExit { .. } => "exec_non_zero_exit",
            ExecError::KilledBySignal => "exec_killed_by_signal",
        }
    }
}
