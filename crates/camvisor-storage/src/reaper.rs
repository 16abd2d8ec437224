//! # DiskReaper: deletes the oldest recording while free space is low.
//!
//! ```text
//! every interval:
//!   available_kb(root) ── error ─► warn, skip tick
//!        │
//!        ├─ >= min_free_kb ─► Healthy
//!        └─ <  min_free_kb ─► scan root (sorted, recursive)
//!                               ├─ oldest settled recording ─► remove ─► Deleted
//!                               └─ none                     ─► NothingToDelete (error log)
//! ```
//!
//! At most one file is removed per tick; the next tick re-measures first.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use camvisor_core::{Worker, WorkerError, WorkerRef};
use camvisor_model::{RecordingName, WorkerKind, parse_folder_name};
use time::{Date, OffsetDateTime, UtcOffset};
use tokio::{task, time as rt_time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{error::StorageError, probe::SpaceProbe};

const TARGET: &str = "camvisor.storage.reaper";

#[derive(Clone, Debug)]
pub struct ReaperConfig {
    /// Recording root, scanned recursively.
    pub root: PathBuf,
    /// Deletion starts when available space drops below this many kilobytes.
    pub min_free_kb: u64,
    pub interval: Duration,
    /// Files modified more recently than this are treated as still being written.
    pub settle: Duration,
    /// Local UTC offset; date folders from before today are pruned once empty.
    pub offset: UtcOffset,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            min_free_kb: 200_000,
            interval: Duration::from_secs(5),
            settle: Duration::from_secs(30),
            offset: UtcOffset::UTC,
        }
    }
}

/// Result of one [`DiskReaper::tick`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    Healthy { available_kb: u64 },
    Deleted { path: PathBuf, available_kb: u64 },
    NothingToDelete { available_kb: u64 },
}

pub struct DiskReaper {
    kind: WorkerKind,
    cfg: ReaperConfig,
    probe: Arc<dyn SpaceProbe>,
}

impl DiskReaper {
    pub fn new(cfg: ReaperConfig, probe: Arc<dyn SpaceProbe>) -> Self {
        Self {
            kind: WorkerKind::Reaper,
            cfg,
            probe,
        }
    }

    pub fn arc(cfg: ReaperConfig, probe: Arc<dyn SpaceProbe>) -> WorkerRef {
        Arc::new(Self::new(cfg, probe))
    }

    /// One free-space check; deletes at most one recording.
    pub async fn tick(&self) -> Result<TickOutcome, StorageError> {
        let available_kb = self.probe.available_kb(&self.cfg.root).await?;
        if available_kb >= self.cfg.min_free_kb {
            debug!(target: TARGET, available_kb, "free space ok");
            return Ok(TickOutcome::Healthy { available_kb });
        }

        let root = self.cfg.root.clone();
        let settle = self.cfg.settle;
        let today = OffsetDateTime::now_utc().to_offset(self.cfg.offset).date();
        let removed = task::spawn_blocking(move || remove_oldest(&root, settle, SystemTime::now(), today))
            .await
            .map_err(|e| StorageError::io(&self.cfg.root, io::Error::other(e)))??;

        match removed {
            Some(path) => {
                info!(
                    target: TARGET,
                    path = %path.display(),
                    available_kb,
                    min_free_kb = self.cfg.min_free_kb,
                    "disk space low; deleted oldest recording"
                );
                Ok(TickOutcome::Deleted { path, available_kb })
            }
            None => {
                error!(
                    target: TARGET,
                    root = %self.cfg.root.display(),
                    available_kb,
                    min_free_kb = self.cfg.min_free_kb,
                    "disk space low but no recording can be deleted"
                );
                Ok(TickOutcome::NothingToDelete { available_kb })
            }
        }
    }
}

#[async_trait]
impl Worker for DiskReaper {
    fn kind(&self) -> &WorkerKind {
        &self.kind
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkerError> {
        info!(
            target: TARGET,
            root = %self.cfg.root.display(),
            min_free_kb = self.cfg.min_free_kb,
            interval = ?self.cfg.interval,
            "reaper starting"
        );
        loop {
            if let Err(e) = self.tick().await {
                warn!(target: TARGET, error = %e, label = e.as_label(), "reaper tick skipped");
            }
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!(target: TARGET, "reaper teardown");
                    return Err(WorkerError::Canceled);
                }
                _ = rt_time::sleep(self.cfg.interval) => {}
            }
        }
    }
}

/// Finds the recording with the earliest embedded timestamp under `root` and removes it.
///
/// Only an unreadable `root` fails the scan; unreadable subdirectories are skipped.
fn remove_oldest(root: &Path, settle: Duration, now: SystemTime, today: Date) -> Result<Option<PathBuf>, StorageError> {
    let entries = read_sorted(root).map_err(|e| StorageError::io(root, e))?;
    let mut oldest = None;
    visit(entries, settle, now, &mut oldest);
    let Some((path, _)) = oldest else {
        return Ok(None);
    };
    fs::remove_file(&path).map_err(|e| StorageError::io(&path, e))?;
    prune_bucket(root, &path, today);
    Ok(Some(path))
}

fn read_sorted(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|e| e.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn visit(entries: Vec<PathBuf>, settle: Duration, now: SystemTime, oldest: &mut Option<(PathBuf, RecordingName)>) {
    for path in entries {
        let meta = match fs::symlink_metadata(&path) {
            Ok(meta) => meta,
            // removed between listing and stat
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                warn!(target: TARGET, path = %path.display(), error = %e, "cannot stat entry; skipping");
                continue;
            }
        };
        if meta.is_dir() {
            match read_sorted(&path) {
                Ok(children) => visit(children, settle, now, oldest),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(target: TARGET, path = %path.display(), error = %e, "cannot read directory; skipping");
                }
            }
            continue;
        }
        if !meta.is_file() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).and_then(RecordingName::parse) else {
            continue;
        };
        if !is_settled(&meta, settle, now) {
            debug!(target: TARGET, path = %path.display(), "skipping segment still being written");
            continue;
        }
        let older = match oldest {
            Some((_, best)) => name.started_at < best.started_at,
            None => true,
        };
        if older {
            *oldest = Some((path, name));
        }
    }
}

/// Removes the date bucket that held `deleted` once it is empty, unless it is
/// today's or later.
fn prune_bucket(root: &Path, deleted: &Path, today: Date) {
    let Some(bucket) = deleted.parent().filter(|p| *p != root) else {
        return;
    };
    let Some(date) = bucket.file_name().and_then(|n| n.to_str()).and_then(parse_folder_name) else {
        return;
    };
    if date >= today {
        return;
    }
    // fails with ENOTEMPTY while other recordings remain
    if fs::remove_dir(bucket).is_ok() {
        info!(target: TARGET, dir = %bucket.display(), "removed empty date folder");
    }
}

fn is_settled(meta: &fs::Metadata, settle: Duration, now: SystemTime) -> bool {
    match meta.modified() {
        Ok(mtime) => now.duration_since(mtime).is_ok_and(|age| age >= settle),
        // no mtime support: nothing to go by
        Err(_) => true,
    }
}
