use std::sync::Arc;

use camvisor_core::WorkerRef;
use camvisor_exec::{RecorderConfig, StreamRecorder};
use camvisor_model::{CameraSpec, RecordingLayout};
use camvisor_storage::{DfProbe, DiskReaper, FolderRoller, ReaperConfig, RollerConfig};

use crate::config::AgentConfig;

/// One recorder per camera, the disk reaper and, for the dated layout, the folder roller.
pub fn plan_workers(cameras: &[CameraSpec], cfg: &AgentConfig) -> Vec<WorkerRef> {
    let recorder = RecorderConfig {
        root: cfg.root.clone(),
        layout: cfg.layout,
        encoder: cfg.encoder.clone(),
        ..RecorderConfig::default()
    };

    let mut workers: Vec<WorkerRef> = cameras
        .iter()
        .map(|cam| StreamRecorder::arc(cam.clone(), recorder.clone()))
        .collect();

    workers.push(DiskReaper::arc(
        ReaperConfig {
            root: cfg.root.clone(),
            min_free_kb: cfg.min_free_kb,
            offset: cfg.offset,
            ..ReaperConfig::default()
        },
        Arc::new(DfProbe::new()),
    ));

    if cfg.layout == RecordingLayout::Dated {
        workers.push(FolderRoller::arc(RollerConfig {
            root: cfg.root.clone(),
            offset: cfg.offset,
            ..RollerConfig::default()
        }));
    }
    workers
}

#[cfg(test)]
mod tests {
    use super::*;
    use camvisor_model::WorkerKind;

    fn cameras() -> Vec<CameraSpec> {
        ["porch", "garage", "gate"]
            .into_iter()
            .map(|n| CameraSpec::new(n, format!("rtsp://cam/{n}")))
            .collect()
    }

    fn kinds(workers: &[WorkerRef]) -> Vec<WorkerKind> {
        workers.iter().map(|w| w.kind().clone()).collect()
    }

    #[test]
    fn dated_layout_plans_roller() {
        let workers = plan_workers(&cameras(), &AgentConfig::default());
        assert_eq!(
            kinds(&workers),
            vec![
                WorkerKind::camera("porch"),
                WorkerKind::camera("garage"),
                WorkerKind::camera("gate"),
                WorkerKind::Reaper,
                WorkerKind::FolderRoller,
            ]
        );
    }

    #[test]
    fn flat_layout_has_no_roller() {
        let cfg = AgentConfig {
            layout: RecordingLayout::Flat,
            ..AgentConfig::default()
        };
        let workers = plan_workers(&cameras(), &cfg);
        assert_eq!(workers.len(), 4);
        assert!(!kinds(&workers).contains(&WorkerKind::FolderRoller));
    }

    #[test]
    fn no_cameras_still_plans_housekeeping() {
        let workers = plan_workers(&[], &AgentConfig::default());
        assert_eq!(kinds(&workers), vec![WorkerKind::Reaper, WorkerKind::FolderRoller]);
    }
}
