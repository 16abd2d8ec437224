//! Free-space query.

use std::{path::Path, process::Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::StorageError;

/// Reports the space available to unprivileged users on the filesystem holding `path`.
#[async_trait]
pub trait SpaceProbe: Send + Sync + 'static {
    /// Available space in kilobytes (1024 bytes).
    async fn available_kb(&self, path: &Path) -> Result<u64, StorageError>;
}

/// [`SpaceProbe`] backed by `df -Pk`.
#[derive(Clone, Debug)]
pub struct DfProbe {
    program: String,
}

impl Default for DfProbe {
    fn default() -> Self {
        Self {
            program: "df".into(),
        }
    }
}

impl DfProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `program` instead of `df` (same output format expected).
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl SpaceProbe for DfProbe {
    async fn available_kb(&self, path: &Path) -> Result<u64, StorageError> {
        let output = Command::new(&self.program)
            .arg("-Pk")
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| StorageError::probe(format!("spawn {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(StorageError::probe(format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }
        parse_df_available(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Extracts the "Available" column (4th field of the 2nd line) from POSIX `df` output.
pub fn parse_df_available(output: &str) -> Result<u64, StorageError> {
    let line = output
        .lines()
        .nth(1)
        .ok_or_else(|| StorageError::probe("df output has no data line"))?;
    let field = line
        .split_whitespace()
        .nth(3)
        .ok_or_else(|| StorageError::probe(format!("df line too short: {line:?}")))?;
    field
        .parse()
        .map_err(|_| StorageError::probe(format!("df available is not a number: {field:?}")))
}
