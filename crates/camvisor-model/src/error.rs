use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading the camera configuration.
///
/// All of them are fatal at startup: no worker is launched when one occurs.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read camera config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected `<name> <url>`, got {content:?}")]
    MalformedLine { line: usize, content: String },
    #[error("line {line}: duplicate camera name {name:?}")]
    DuplicateName { name: String, line: usize },
}

impl ConfigError {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "config_io",
            ConfigError::MalformedLine { .. } => "config_malformed_line",
            ConfigError::DuplicateName { .. } => "config_duplicate_name",
        }
    }
}
