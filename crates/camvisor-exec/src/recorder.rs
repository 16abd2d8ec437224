//! # StreamRecorder: one encoder process per camera.
//!
//! ```text
//! run(ctx):
//!   spawn encoder (own process group, stdin=null, stdout/stderr piped)
//!   drain stdout/stderr ─► tracing (camvisor.exec.encoder)
//!   select! {
//!     child.wait()   ─► Ok(()) on success, Fail on non-zero / signal
//!     ctx.cancelled  ─► SIGINT, wait stop_timeout, kill ─► Canceled
//!   }
//! ```
//!
//! The supervisor relaunches the same recorder after any exit, so a stream
//! that drops or an encoder that crashes is retried with the original url.

use std::{
    path::PathBuf,
    process::{ExitStatus, Stdio},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use camvisor_core::{Worker, WorkerError, WorkerRef};
use camvisor_model::{CameraSpec, RecordingLayout, WorkerKind};
use tokio::{process::Command, task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    encoder::{EncoderConfig, encoder_args, segment_template},
    util::{drain_lines, stop_graceful},
};

const TARGET: &str = "camvisor.exec.recorder";

/// How long to keep collecting encoder output after it exits.
const DRAIN_TAIL: Duration = Duration::from_secs(1);

/// Settings shared by every recorder.
#[derive(Clone, Debug)]
pub struct RecorderConfig {
    /// Recording root; segment paths are built from it explicitly.
    pub root: PathBuf,
    pub layout: RecordingLayout,
    pub encoder: EncoderConfig,
    /// Time the encoder gets to close its segment after SIGINT.
    pub stop_timeout: Duration,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            layout: RecordingLayout::Dated,
            encoder: EncoderConfig::default(),
            stop_timeout: Duration::from_secs(10),
        }
    }
}

/// Worker recording one camera stream into segmented files.
pub struct StreamRecorder {
    kind: WorkerKind,
    camera: CameraSpec,
    cfg: RecorderConfig,
}

impl StreamRecorder {
    pub fn new(camera: CameraSpec, cfg: RecorderConfig) -> Self {
        Self {
            kind: WorkerKind::camera(camera.name.clone()),
            camera,
            cfg,
        }
    }

    pub fn arc(camera: CameraSpec, cfg: RecorderConfig) -> WorkerRef {
        Arc::new(Self::new(camera, cfg))
    }

    /// Output template handed to the encoder.
    pub fn template(&self) -> PathBuf {
        segment_template(&self.cfg.root, &self.camera.name, self.cfg.layout)
    }

    /// Encoder arguments for this camera, without the program name.
    pub fn args(&self) -> Vec<String> {
        encoder_args(&self.cfg.encoder, &self.camera.source_url, &self.template())
    }

    async fn record(&self, ctx: &CancellationToken) -> Result<(), WorkerError> {
        let program = &self.cfg.encoder.program;
        let args = self.args();
        debug!(target: TARGET, camera = %self.camera.name, %program, ?args, "spawn");

        let mut cmd = Command::new(program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd
            .spawn()
            .map_err(|e| WorkerError::fail(format!("spawn {program}: {e}")))?;

        let mut drains: Vec<JoinHandle<()>> = Vec::with_capacity(2);
        if let Some(out) = child.stdout.take() {
            drains.push(drain_lines(out, self.camera.name.clone(), "stdout"));
        }
        if let Some(err) = child.stderr.take() {
            drains.push(drain_lines(err, self.camera.name.clone(), "stderr"));
        }

        let result = tokio::select! {
            status = child.wait() => {
                status
                    .map_err(|e| WorkerError::fail(format!("wait: {e}")))
                    .and_then(classify)
            }
            _ = ctx.cancelled() => {
                debug!(target: TARGET, camera = %self.camera.name, "cancelled; interrupting encoder");
                if !stop_graceful(&mut child, self.cfg.stop_timeout).await {
                    warn!(target: TARGET, camera = %self.camera.name, "encoder killed after stop timeout");
                }
                Err(WorkerError::Canceled)
            }
        };

        finish_drains(drains).await;
        result
    }
}

fn classify(status: ExitStatus) -> Result<(), WorkerError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(WorkerError::fail(format!("encoder exited with code {code}"))),
        None => Err(WorkerError::fail("encoder terminated by signal")),
    }
}

async fn finish_drains(drains: Vec<JoinHandle<()>>) {
    for mut h in drains {
        if time::timeout(DRAIN_TAIL, &mut h).await.is_err() {
            h.abort();
        }
    }
}

#[async_trait]
impl Worker for StreamRecorder {
    fn kind(&self) -> &WorkerKind {
        &self.kind
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), WorkerError> {
        info!(
            target: TARGET,
            camera = %self.camera.name,
            url = %self.camera.source_url,
            root = %self.cfg.root.display(),
            "recorder starting"
        );
        let result = self.record(&ctx).await;
        match &result {
            Ok(()) => info!(target: TARGET, camera = %self.camera.name, "recorder teardown"),
            Err(e) => {
                info!(target: TARGET, camera = %self.camera.name, reason = %e, "recorder teardown")
            }
        }
        result
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::{fs, path::Path};

    use camvisor_core::{Supervisor, SupervisorConfig};
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    fn camera(name: &str) -> CameraSpec {
        CameraSpec {
            name: name.into(),
            source_url: format!("rtsp://cam/{name}"),
        }
    }

    /// Recorder config running `sh <script>` as the encoder.
    fn shell_encoder(root: &Path, script: &Path, stop_timeout: Duration) -> RecorderConfig {
        RecorderConfig {
            root: root.to_path_buf(),
            layout: RecordingLayout::Dated,
            encoder: EncoderConfig {
                program: "sh".into(),
                input_args: vec![script.to_string_lossy().into_owned()],
                ..EncoderConfig::default()
            },
            stop_timeout,
        }
    }

    async fn wait_for(path: &Path) {
        for _ in 0..500 {
            if path.exists() {
                return;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never appeared", path.display());
    }

    #[test]
    fn kind_is_camera_name() {
        let rec = StreamRecorder::new(camera("porch"), RecorderConfig::default());
        assert_eq!(rec.kind(), &WorkerKind::camera("porch"));
    }

    #[test]
    fn args_point_at_dated_template() {
        let rec = StreamRecorder::new(
            camera("porch"),
            RecorderConfig {
                root: PathBuf::from("/srv/rec"),
                ..RecorderConfig::default()
            },
        );
        let args = rec.args();
        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "rtsp://cam/porch");
        assert_eq!(
            args.last().map(String::as_str),
            Some("/srv/rec/%Y-%m-%d/porch_%Y-%m-%d_%H-%M-%S.mp4")
        );
    }

    #[tokio::test]
    async fn encoder_success_and_failure_are_classified() {
        let dir = TempDir::new().unwrap();
        let ok = dir.path().join("ok.sh");
        let bad = dir.path().join("bad.sh");
        fs::write(&ok, "exit 0\n").unwrap();
        fs::write(&bad, "echo 'Connection refused' >&2\nexit 1\n").unwrap();

        let ctx = CancellationToken::new();
        let rec = StreamRecorder::new(
            camera("porch"),
            shell_encoder(dir.path(), &ok, Duration::from_secs(1)),
        );
        assert!(rec.run(ctx.clone()).await.is_ok());

        let rec = StreamRecorder::new(
            camera("porch"),
            shell_encoder(dir.path(), &bad, Duration::from_secs(1)),
        );
        let err = rec.run(ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "worker failed: encoder exited with code 1");
    }

    #[tokio::test]
    async fn missing_encoder_fails_the_run() {
        let cfg = RecorderConfig {
            encoder: EncoderConfig {
                program: "/nonexistent/camvisor-encoder".into(),
                ..EncoderConfig::default()
            },
            ..RecorderConfig::default()
        };
        let rec = StreamRecorder::new(camera("porch"), cfg);
        let err = rec.run(CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, WorkerError::Fail { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn non_utf8_output_keeps_pipes_drained() {
        let dir = TempDir::new().unwrap();
        let done = dir.path().join("done");
        let script = dir.path().join("latin1.sh");
        // a Latin-1 stream title, then far more than a pipe buffer of progress lines
        fs::write(
            &script,
            format!(
                "printf 'title: caf\\351\\n' >&2\n\
                 i=0\n\
                 while [ $i -lt 20000 ]; do\n\
                 echo \"frame=$i fps=25 q=-1.0 size=1024kB time=00:00:01.00 bitrate=8000kbits/s\" >&2\n\
                 i=$((i+1))\n\
                 done\n\
                 echo ok > {done}\n\
                 exit 0\n",
                done = done.display(),
            ),
        )
        .unwrap();

        let rec = StreamRecorder::new(
            camera("porch"),
            shell_encoder(dir.path(), &script, Duration::from_secs(1)),
        );
        let res = time::timeout(Duration::from_secs(30), rec.run(CancellationToken::new()))
            .await
            .expect("encoder blocked on its output");
        assert!(res.is_ok(), "{res:?}");
        assert_eq!(fs::read_to_string(&done).unwrap().trim(), "ok");
    }

    #[tokio::test]
    async fn cancel_interrupts_encoder_and_lets_it_finish() {
        let dir = TempDir::new().unwrap();
        let started = dir.path().join("started");
        let stopped = dir.path().join("stopped");
        let argv = dir.path().join("argv");
        let script = dir.path().join("enc.sh");
        fs::write(
            &script,
            format!(
                "trap 'echo interrupted > {stopped}; exit 0' INT\n\
                 echo \"$@\" > {argv}\n\
                 echo started > {started}\n\
                 while true; do sleep 0.05; done\n",
                stopped = stopped.display(),
                argv = argv.display(),
                started = started.display(),
            ),
        )
        .unwrap();

        let rec = StreamRecorder::new(
            camera("porch"),
            shell_encoder(dir.path(), &script, Duration::from_secs(5)),
        );
        let ctx = CancellationToken::new();
        let run = tokio::spawn({
            let ctx = ctx.clone();
            async move { rec.run(ctx).await }
        });

        wait_for(&started).await;
        ctx.cancel();
        let res = run.await.unwrap();
        assert!(matches!(res, Err(WorkerError::Canceled)), "{res:?}");
        assert_eq!(fs::read_to_string(&stopped).unwrap().trim(), "interrupted");

        let argv = fs::read_to_string(&argv).unwrap();
        assert!(argv.contains("-i rtsp://cam/porch"), "{argv}");
        assert!(argv.contains("-segment_time 300"), "{argv}");
    }

    #[tokio::test]
    async fn encoder_ignoring_interrupt_is_killed() {
        let dir = TempDir::new().unwrap();
        let started = dir.path().join("started");
        let script = dir.path().join("stubborn.sh");
        fs::write(
            &script,
            format!(
                "trap '' INT\n\
                 echo started > {started}\n\
                 while true; do sleep 0.05; done\n",
                started = started.display(),
            ),
        )
        .unwrap();

        let rec = StreamRecorder::new(
            camera("porch"),
            shell_encoder(dir.path(), &script, Duration::from_millis(200)),
        );
        let ctx = CancellationToken::new();
        let run = tokio::spawn({
            let ctx = ctx.clone();
            async move { rec.run(ctx).await }
        });

        wait_for(&started).await;
        ctx.cancel();
        let res = time::timeout(Duration::from_secs(5), run)
            .await
            .expect("recorder did not stop")
            .unwrap();
        assert!(matches!(res, Err(WorkerError::Canceled)), "{res:?}");
    }

    #[tokio::test]
    async fn crashing_encoder_is_restarted_by_supervisor() {
        let dir = TempDir::new().unwrap();
        let runs = dir.path().join("runs");
        let script = dir.path().join("crash.sh");
        fs::write(
            &script,
            format!("echo run >> {runs}\nexit 1\n", runs = runs.display()),
        )
        .unwrap();

        let rec = StreamRecorder::arc(
            camera("porch"),
            shell_encoder(dir.path(), &script, Duration::from_secs(1)),
        );
        let sup = Supervisor::new(SupervisorConfig::default());
        let (stop, stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            sup.run(vec![rec], async move {
                let _ = stop_rx.await;
                Ok(())
            })
            .await
        });

        let mut count = 0;
        for _ in 0..1000 {
            count = fs::read_to_string(&runs)
                .map(|s| s.lines().count())
                .unwrap_or(0);
            if count >= 6 {
                break;
            }
            time::sleep(Duration::from_millis(10)).await;
        }
        assert!(count >= 6, "only {count} runs");

        stop.send(()).unwrap();
        let report = handle.await.unwrap().unwrap();
        assert!(report.restarts >= 5);
        assert_eq!(report.stopped, vec![WorkerKind::camera("porch")]);
    }
}
