use camvisor_core::CoreError;
use camvisor_exec::ExecError;
use camvisor_model::ConfigError;
use camvisor_observe::LoggerError;
use thiserror::Error;

/// Everything that makes the daemon exit with a failure code.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("invalid {var}={value:?}: {reason}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("camera config: {0}")]
    Config(#[from] ConfigError),

    #[error("encoder unavailable: {0}")]
    Encoder(#[from] ExecError),

    #[error("logger: {0}")]
    Logger(#[from] LoggerError),

    #[error("supervisor: {0}")]
    Supervisor(#[from] CoreError),
}
