//! Daemon configuration from environment variables.

use std::{path::PathBuf, str::FromStr, time::Duration};

use camvisor_exec::EncoderConfig;
use camvisor_model::RecordingLayout;
use camvisor_observe::{LoggerConfig, LoggerFormat};
use time::UtcOffset;

use crate::error::AgentError;

pub const ENV_ROOT: &str = "CAMVISOR_ROOT";
pub const ENV_CAMERAS: &str = "CAMVISOR_CAMERAS";
pub const ENV_ENCODER: &str = "CAMVISOR_ENCODER";
pub const ENV_SEGMENT_SECONDS: &str = "CAMVISOR_SEGMENT_SECONDS";
pub const ENV_MIN_FREE_KB: &str = "CAMVISOR_MIN_FREE_KB";
pub const ENV_LAYOUT: &str = "CAMVISOR_LAYOUT";
pub const ENV_GRACE_SECONDS: &str = "CAMVISOR_GRACE_SECONDS";
pub const ENV_LOG_LEVEL: &str = "CAMVISOR_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "CAMVISOR_LOG_FORMAT";

/// Name of the camera list inside the recording root.
pub const CAMERAS_FILE: &str = "cameras.config";

#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// Recording root; every worker gets it explicitly.
    pub root: PathBuf,
    pub cameras_path: PathBuf,
    pub encoder: EncoderConfig,
    pub min_free_kb: u64,
    pub layout: RecordingLayout,
    /// Shutdown grace period for all workers together.
    pub grace: Duration,
    /// Local offset used for date folders.
    pub offset: UtcOffset,
    pub logger: LoggerConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let root = PathBuf::from(".");
        Self {
            cameras_path: root.join(CAMERAS_FILE),
            root,
            encoder: EncoderConfig::default(),
            min_free_kb: 200_000,
            layout: RecordingLayout::Dated,
            grace: Duration::from_secs(30),
            offset: UtcOffset::UTC,
            logger: LoggerConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Reads the process environment; the first CLI argument, if any, overrides the root.
    pub fn from_env() -> Result<Self, AgentError> {
        let mut cfg = Self::from_lookup(std::env::args().nth(1), |key| std::env::var(key).ok())?;
        cfg.offset = camvisor_observe::local_offset();
        Ok(cfg)
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(root_arg: Option<String>, lookup: F) -> Result<Self, AgentError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut cfg = Self::default();

        if let Some(root) = root_arg.or_else(|| get(ENV_ROOT)) {
            cfg.root = PathBuf::from(root);
        }
        cfg.cameras_path = get(ENV_CAMERAS)
            .map(PathBuf::from)
            .unwrap_or_else(|| cfg.root.join(CAMERAS_FILE));

        if let Some(program) = get(ENV_ENCODER) {
            cfg.encoder.program = program;
        }
        if let Some(v) = get(ENV_SEGMENT_SECONDS) {
            cfg.encoder.segment_seconds = parse(ENV_SEGMENT_SECONDS, v)?;
        }
        if let Some(v) = get(ENV_MIN_FREE_KB) {
            cfg.min_free_kb = parse(ENV_MIN_FREE_KB, v)?;
        }
        if let Some(v) = get(ENV_LAYOUT) {
            cfg.layout = parse(ENV_LAYOUT, v)?;
        }
        if let Some(v) = get(ENV_GRACE_SECONDS) {
            cfg.grace = Duration::from_secs(parse(ENV_GRACE_SECONDS, v)?);
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            cfg.logger.level = level;
        }
        if let Some(v) = get(ENV_LOG_FORMAT) {
            cfg.logger.format = parse::<LoggerFormat>(ENV_LOG_FORMAT, v)?;
        }
        Ok(cfg)
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, AgentError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| AgentError::InvalidEnv {
        var,
        reason: e.to_string(),
        value,
    })
}
