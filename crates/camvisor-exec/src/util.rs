use std::{io, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    process::Child,
    task::JoinHandle,
    time,
};
use tracing::{debug, warn};

#[cfg(unix)]
use nix::{
    sys::signal::{Signal, killpg},
    unistd::Pid,
};

const ENCODER_TARGET: &str = "camvisor.exec.encoder";

/// Forwards every line of `stream` to the log until EOF.
///
/// Bytes that are not UTF-8 are replaced, never treated as the end of output:
/// the pipe has to stay drained for as long as the encoder writes to it.
pub(crate) fn drain_lines<R>(stream: R, camera: String, channel: &'static str) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::with_capacity(256);
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']);
                    debug!(target: ENCODER_TARGET, %camera, channel, "{line}");
                }
                Err(e) => {
                    debug!(target: ENCODER_TARGET, %camera, channel, error = %e, "encoder output unreadable");
                    break;
                }
            }
        }
    })
}

/// Asks the child to finish (SIGINT to its process group), then kills it if it
/// is still alive after `timeout`.
///
/// Returns `true` if the child exited on its own within `timeout`.
pub(crate) async fn stop_graceful(child: &mut Child, timeout: Duration) -> bool {
    if let Err(e) = interrupt(child) {
        debug!(target: ENCODER_TARGET, error = %e, "interrupt failed");
    }
    match time::timeout(timeout, child.wait()).await {
        Ok(_) => true,
        Err(_) => {
            warn!(target: ENCODER_TARGET, ?timeout, "encoder ignored interrupt; killing");
            kill_hard(child).await;
            false
        }
    }
}

#[cfg(unix)]
fn interrupt(child: &mut Child) -> io::Result<()> {
    signal_group(child, Signal::SIGINT)
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

#[cfg(unix)]
async fn kill_hard(child: &mut Child) {
    let _ = signal_group(child, Signal::SIGKILL);
    let _ = child.kill().await;
}

#[cfg(not(unix))]
async fn kill_hard(child: &mut Child) {
    let _ = child.kill().await;
}

/// The child leads its own process group, so the signal reaches it and anything it forked.
#[cfg(unix)]
fn signal_group(child: &Child, signal: Signal) -> io::Result<()> {
    let Some(id) = child.id() else {
        // already reaped
        return Ok(());
    };
    let pgrp = i32::try_from(id).map_err(io::Error::other)?;
    killpg(Pid::from_raw(pgrp), signal)?;
    Ok(())
}
