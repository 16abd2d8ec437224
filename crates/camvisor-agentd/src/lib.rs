//! camvisor daemon: configuration, startup checks and the worker plan.
//!
//! ```text
//! logger ─► AgentConfig::from_env ─► load cameras ─► probe encoder ─► plan_workers ─► Supervisor
//! ```
//! Any failure before the supervisor starts aborts with zero workers launched.

mod config;
pub use config::{AgentConfig, CAMERAS_FILE};

mod error;
pub use error::AgentError;

mod plan;
pub use plan::plan_workers;

use camvisor_core::{ShutdownReport, Supervisor, SupervisorConfig, WorkerRef};
use camvisor_exec::probe_encoder;
use camvisor_model::load_cameras;
use tracing::{info, warn};

const TARGET: &str = "camvisor.agentd";

/// Loads cameras, checks the encoder and builds the worker plan.
pub async fn prepare(cfg: &AgentConfig) -> Result<Vec<WorkerRef>, AgentError> {
    let cameras = load_cameras(&cfg.cameras_path)?;
    if cameras.is_empty() {
        warn!(target: TARGET, path = %cfg.cameras_path.display(), "no cameras configured; only housekeeping will run");
    }
    info!(target: TARGET, cameras = cameras.len(), path = %cfg.cameras_path.display(), "cameras loaded");

    let banner = probe_encoder(&cfg.encoder.program).await?;
    info!(target: TARGET, program = %cfg.encoder.program, %banner, "encoder available");

    Ok(plan_workers(&cameras, cfg))
}

/// Runs the daemon until SIGINT/SIGTERM.
pub async fn run(cfg: AgentConfig) -> Result<ShutdownReport, AgentError> {
    let workers = prepare(&cfg).await?;
    let supervisor = Supervisor::new(SupervisorConfig {
        grace: cfg.grace,
        ..SupervisorConfig::default()
    });
    info!(target: TARGET, root = %cfg.root.display(), workers = workers.len(), "recording");
    Ok(supervisor.run_until_signal(workers).await?)
}
