use std::process::ExitCode;

use anyhow::Context;
use camvisor_agentd::AgentConfig;
use camvisor_observe::{LoggerConfig, init_local_offset, logger_init};
use tracing::{error, info};

fn main() -> ExitCode {
    // 1) Local offset, before any thread exists
    init_local_offset();

    // 2) Logger (configured from the environment when it parses)
    let cfg = AgentConfig::from_env();
    let logger = cfg
        .as_ref()
        .map(|c| c.logger.clone())
        .unwrap_or_else(|_| LoggerConfig::default());
    if let Err(e) = logger_init(&logger) {
        eprintln!("camvisord: {e}");
        return ExitCode::FAILURE;
    }

    // 3) Everything else
    match cfg.context("configuration").and_then(serve) {
        Ok(()) => {
            info!("camvisord stopped cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = format!("{e:#}"), "camvisord exiting");
            ExitCode::FAILURE
        }
    }
}

fn serve(cfg: AgentConfig) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("tokio runtime")?;

    let report = runtime.block_on(camvisor_agentd::run(cfg))?;
    info!(
        stopped = report.stopped.len(),
        restarts = report.restarts,
        "all workers stopped"
    );
    Ok(())
}
