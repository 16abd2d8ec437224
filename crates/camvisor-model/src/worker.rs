use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity of a supervised worker.
///
/// The supervisor keeps exactly one live worker per registered kind and
/// relaunches a worker of the same kind whenever one exits.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "name")]
pub enum WorkerKind {
    /// Deletes the oldest recording when free space runs low.
    Reaper,
    /// Keeps the date bucket for today (and tomorrow near midnight) present.
    FolderRoller,
    /// Records one camera.
    Camera(String),
}

impl WorkerKind {
    pub fn camera(name: impl Into<String>) -> Self {
        WorkerKind::Camera(name.into())
    }

    /// Short symbolic identifier used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            WorkerKind::Reaper => "reaper",
            WorkerKind::FolderRoller => "folder-roller",
            WorkerKind::Camera(_) => "camera",
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerKind::Camera(name) => write!(f, "camera:{name}"),
            other => f.write_str(other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(WorkerKind::Reaper.to_string(), "reaper");
        assert_eq!(WorkerKind::FolderRoller.to_string(), "folder-roller");
        assert_eq!(WorkerKind::camera("porch").to_string(), "camera:porch");
    }

    #[test]
    fn serde_shape() {
        let json = serde_json::to_string(&WorkerKind::camera("porch")).unwrap();
        assert_eq!(json, r#"{"type":"camera","name":"porch"}"#);
        let back: WorkerKind = serde_json::from_str(r#"{"type":"reaper"}"#).unwrap();
        assert_eq!(back, WorkerKind::Reaper);
    }
}
