//! FolderRoller: keeps `<root>/<today>` and `<root>/<tomorrow>` present so the
//! encoder can always open its next segment.
//!
//! The offset is captured once at startup and goes stale across a DST change,
//! so tomorrow's folder is ensured on every tick rather than near midnight
//! only. That covers any offset error below a day.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use camvisor_core::{Worker, WorkerError, WorkerRef};
use camvisor_model::{WorkerKind, folder_name};
use time::{Date, OffsetDateTime, UtcOffset};
use tokio::time as rt_time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::StorageError;

const TARGET: &str = "camvisor.storage.roller";

#[derive(Clone, Debug)]
pub struct RollerConfig {
    pub root: PathBuf,
    pub interval: Duration,
    /// Local UTC offset used to decide what "today" is.
    pub offset: UtcOffset,
}

impl Default for RollerConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            interval: Duration::from_secs(5),
            offset: UtcOffset::UTC,
        }
    }
}

pub struct FolderRoller {
    kind: WorkerKind,
    cfg: RollerConfig,
}

impl FolderRoller {
    pub fn new(cfg: RollerConfig) -> Self {
        Self {
            kind: WorkerKind::FolderRoller,
            cfg,
        }
    }

    pub fn arc(cfg: RollerConfig) -> WorkerRef {
        Arc::new(Self::new(cfg))
    }

    /// Ensures today's and tomorrow's folders as of `now`; returns them in date order.
    pub fn tick_at(&self, now: OffsetDateTime) -> Result<Vec<PathBuf>, StorageError> {
        let today = now.date();
        let mut ensured = vec![self.ensure(today)?];
        if let Some(tomorrow) = today.next_day() {
            ensured.push(self.ensure(tomorrow)?);
        }
        Ok(ensured)
    }

    fn ensure(&self, date: Date) -> Result<PathBuf, StorageError> {
        let dir = self.cfg.root.join(folder_name(date));
        if is_dir(&dir) {
            return Ok(dir);
        }
        fs::create_dir_all(&dir).map_err(|e| StorageError::io(&dir, e))?;
        info!(target: TARGET, dir = %dir.display(), "created date folder");
        Ok(dir)
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.cfg.offset)
    }
}

fn is_dir(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_dir())
}

#[async_trait]
impl Worker for FolderRoller {
    fn kind(&self) -> &WorkerKind {
        &self.kind
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkerError> {
        info!(target: TARGET, root = %self.cfg.root.display(), offset = %self.cfg.offset, "roller starting");
        loop {
            match self.tick_at(self.now()) {
                Ok(dirs) => debug!(target: TARGET, ?dirs, "date folders present"),
                Err(e) => warn!(target: TARGET, error = %e, label = e.as_label(), "roller tick skipped"),
            }
            tokio::select! {
                _ = ctx.cancelled() => {
                    info!(target: TARGET, "roller teardown");
                    return Err(WorkerError::Canceled);
                }
                _ = rt_time::sleep(self.cfg.interval) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use time::macros::{datetime, offset};

    fn roller(root: &Path) -> FolderRoller {
        FolderRoller::new(RollerConfig {
            root: root.to_path_buf(),
            ..RollerConfig::default()
        })
    }

    #[test]
    fn near_midnight_creates_today_and_tomorrow() {
        let dir = TempDir::new().unwrap();
        let got = roller(dir.path())
            .tick_at(datetime!(2024-03-09 23:55:00 UTC))
            .unwrap();
        assert_eq!(
            got,
            vec![dir.path().join("2024-03-09"), dir.path().join("2024-03-10")]
        );
        assert!(dir.path().join("2024-03-09").is_dir());
        assert!(dir.path().join("2024-03-10").is_dir());
    }

    #[test]
    fn midday_also_prepares_tomorrow() {
        let dir = TempDir::new().unwrap();
        let got = roller(dir.path())
            .tick_at(datetime!(2024-03-09 12:00:00 UTC))
            .unwrap();
        assert_eq!(
            got,
            vec![dir.path().join("2024-03-09"), dir.path().join("2024-03-10")]
        );
    }

    #[test]
    fn stale_offset_still_covers_the_real_day() {
        let dir = TempDir::new().unwrap();
        // captured before the DST switch (+01) while the wall clock is already +02
        let r = FolderRoller::new(RollerConfig {
            root: dir.path().to_path_buf(),
            offset: offset!(+1),
            ..RollerConfig::default()
        });
        let real = datetime!(2024-06-09 22:10:00 UTC).to_offset(offset!(+2));
        assert_eq!(folder_name(real.date()), "2024-06-10");

        r.tick_at(datetime!(2024-06-09 22:10:00 UTC).to_offset(r.cfg.offset))
            .unwrap();
        assert!(dir.path().join("2024-06-10").is_dir());
    }

    #[test]
    fn ticks_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let r = roller(dir.path());
        let first = r.tick_at(datetime!(2024-12-31 23:58:00 UTC)).unwrap();
        let second = r.tick_at(datetime!(2024-12-31 23:59:00 UTC)).unwrap();
        assert_eq!(first, second);
        assert_eq!(second[1], dir.path().join("2025-01-01"));
    }

    #[test]
    fn date_follows_the_local_offset() {
        let dir = TempDir::new().unwrap();
        // 22:30 UTC is already the next day at +02:00
        let now = datetime!(2024-03-09 22:30:00 UTC).to_offset(offset!(+2));
        let got = roller(dir.path()).tick_at(now).unwrap();
        assert_eq!(
            got,
            vec![dir.path().join("2024-03-10"), dir.path().join("2024-03-11")]
        );
    }

    #[test]
    fn unwritable_root_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not-a-dir");
        fs::write(&file, b"").unwrap();
        let err = roller(&file)
            .tick_at(datetime!(2024-03-09 12:00:00 UTC))
            .unwrap_err();
        assert_eq!(err.as_label(), "storage_io");
    }

    #[tokio::test]
    async fn run_stops_on_cancel() {
        let dir = TempDir::new().unwrap();
        let r = roller(dir.path());
        let ctx = CancellationToken::new();
        ctx.cancel();
        let res = r.run(ctx).await;
        assert!(matches!(res, Err(WorkerError::Canceled)));
        let today = folder_name(r.now().date());
        assert!(dir.path().join(today).is_dir());
    }
}
