//! Encoder invocation: argument list, output template, capability probe.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use camvisor_model::{FILE_DATE_FORMAT, FOLDER_DATE_FORMAT, RECORDING_EXTENSION, RecordingLayout};
use tokio::process::Command;

use crate::error::{ExecError, ExecResult};

/// External encoder settings shared by every camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Executable name or path.
    pub program: String,
    /// Length of one recorded segment.
    pub segment_seconds: u32,
    /// Audio codec passed to `-c:a`.
    pub audio_codec: String,
    /// Extra arguments placed before `-i` (e.g. `-rtsp_transport tcp`).
    pub input_args: Vec<String>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".into(),
            segment_seconds: 300,
            audio_codec: "aac".into(),
            input_args: Vec::new(),
        }
    }
}

/// Output path template for one camera.
///
/// Dated: `<root>/%Y-%m-%d/<camera>_%Y-%m-%d_%H-%M-%S.mp4`,
/// flat: `<root>/<camera>_%Y-%m-%d_%H-%M-%S.mp4`.
pub fn segment_template(root: &Path, camera: &str, layout: RecordingLayout) -> PathBuf {
    let file = format!("{camera}_{FILE_DATE_FORMAT}{RECORDING_EXTENSION}");
    match layout {
        RecordingLayout::Dated => root.join(FOLDER_DATE_FORMAT).join(file),
        RecordingLayout::Flat => root.join(file),
    }
}

/// Full argument list (without the program) for recording `url` into `template`.
pub fn encoder_args(cfg: &EncoderConfig, url: &str, template: &Path) -> Vec<String> {
    let segment_time = cfg.segment_seconds.to_string();
    let mut args = cfg.input_args.clone();
    args.extend(
        [
            "-i",
            url,
            "-vcodec",
            "copy",
            "-c:a",
            cfg.audio_codec.as_str(),
            "-map",
            "0",
            "-f",
            "segment",
            "-segment_time",
            segment_time.as_str(),
            "-segment_format",
            "mp4",
            "-reset_timestamps",
            "1",
            "-strftime",
            "1",
            "-strftime_mkdir",
            "1",
        ]
        .map(String::from),
    );
    args.push(template.to_string_lossy().into_owned());
    args
}

/// Runs `<program> -version` and returns the first line of its banner.
///
/// Used at startup to fail fast when the encoder is not installed.
pub async fn probe_encoder(program: &str) -> ExecResult<String> {
    let output = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| ExecError::MissingProgram {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(match output.status.code() {
            Some(code) => ExecError::NonZeroExit { code },
            None => ExecError::KilledBySignal,
        });
    }

    let banner = String::from_utf8_lossy(&output.stdout);
    Ok(banner.lines().next().unwrap_or_default().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dated_template() {
        let t = segment_template(Path::new("/srv/rec"), "porch", RecordingLayout::Dated);
        assert_eq!(
            t,
            PathBuf::from("/srv/rec/%Y-%m-%d/porch_%Y-%m-%d_%H-%M-%S.mp4")
        );
    }

    #[test]
    fn flat_template() {
        let t = segment_template(Path::new("/srv/rec"), "porch", RecordingLayout::Flat);
        assert_eq!(t, PathBuf::from("/srv/rec/porch_%Y-%m-%d_%H-%M-%S.mp4"));
    }

    #[test]
    fn argument_order() {
        let cfg = EncoderConfig {
            input_args: vec!["-rtsp_transport".into(), "tcp".into()],
            ..EncoderConfig::default()
        };
        let args = encoder_args(
            &cfg,
            "rtsp://10.0.0.5/stream1",
            Path::new("/r/porch_%Y-%m-%d_%H-%M-%S.mp4"),
        );
        assert_eq!(
            args,
            [
                "-rtsp_transport",
                "tcp",
                "-i",
                "rtsp://10.0.0.5/stream1",
                "-vcodec",
                "copy",
                "-c:a",
                "aac",
                "-map",
                "0",
                "-f",
                "segment",
                "-segment_time",
                "300",
                "-segment_format",
                "mp4",
                "-reset_timestamps",
                "1",
                "-strftime",
                "1",
                "-strftime_mkdir",
                "1",
                "/r/porch_%Y-%m-%d_%H-%M-%S.mp4",
            ]
        );
    }

    #[tokio::test]
    async fn probe_missing_program() {
        let err = probe_encoder("/nonexistent/camvisor-encoder")
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::MissingProgram { .. }), "{err:?}");
        assert_eq!(err.as_label(), "exec_missing_program");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_non_zero_exit() {
        let err = probe_encoder("false").await.unwrap_err();
        assert!(matches!(err, ExecError::NonZeroExit { code: 1 }), "{err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn probe_accepts_silent_program() {
        assert_eq!(probe_encoder("true").await.unwrap(), "");
    }
}
