//! Tokio process adapter
//!
//! Runs external programs on the tokio runtime, capturing stdout and stderr
//! into memory while waiting, and kills the child when its abort token fires.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::model::*;
use crate::ports::*;

/// How long output is still collected after an abort. A grandchild that
/// inherited the pipes can hold them open long after the child is gone.
const ABORT_DRAIN_LIMIT: Duration = Duration::from_millis(500);

/// Process runner backed by `tokio::process`
#[derive(Debug, Clone, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for TokioProcessRunner {
    fn run(&self, spec: ProcessSpec, abort: CancellationToken) -> ProcessHandle {
        let (tx, rx) = oneshot::channel();
        let program = spec.program().to_string();
        let token = abort.clone();

        tokio::spawn(async move {
            let result = execute(spec, token).await;
            if tx.send(result).is_err() {
                debug!("process result dropped; nobody is waiting");
            }
        });

        ProcessHandle::new(program, abort, rx)
    }
}

async fn execute(spec: ProcessSpec, abort: CancellationToken) -> ProcessResult {
    let program = spec.program().to_string();

    let mut cmd = Command::new(spec.program());
    cmd.args(spec.arguments())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            warn!(program = %program, error = %e, "failed to spawn process");
            return ProcessResult::launch_failed(program, e.to_string());
        }
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    // Pipes are drained while waiting so a chatty child cannot block on them
    let wait = async {
        tokio::select! {
            status = child.wait() => match status {
                Ok(status) => match status.code() {
                    Some(code) => ProcessStatus::Exited(code),
                    None => ProcessStatus::Signaled,
                },
                Err(e) => ProcessStatus::LaunchFailed(format!("wait failed: {}", e)),
            },
            _ = abort.cancelled() => {
                debug!(program = %program, "aborting process");
                if let Err(e) = child.kill().await {
                    warn!(program = %program, error = %e, "failed to kill process");
                }
                ProcessStatus::Aborted
            }
        }
    };

    let (status, stdout, stderr) = {
        let pipes = async move { tokio::join!(read_pipe(stdout), read_pipe(stderr)) };
        tokio::pin!(wait);
        tokio::pin!(pipes);

        let mut drained = None;
        let status = loop {
            tokio::select! {
                status = &mut wait => break status,
                output = &mut pipes, if drained.is_none() => drained = Some(output),
            }
        };

        let (stdout, stderr) = match drained {
            Some(output) => output,
            None if status == ProcessStatus::Aborted => {
                match tokio::time::timeout(ABORT_DRAIN_LIMIT, &mut pipes).await {
                    Ok(output) => output,
                    Err(_) => {
                        debug!(program = %program, "output pipes still open after abort; dropping them");
                        (String::new(), String::new())
                    }
                }
            }
            None => pipes.await,
        };
        (status, stdout, stderr)
    };

    ProcessResult {
        program,
        status,
        stdout,
        stderr,
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "error reading process output");
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
