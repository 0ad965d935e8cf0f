// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for launching external processes without blocking the caller
pub trait ProcessRunner: Send + Sync {
    /// Launch `spec` now and return a handle whose completion carries the result.
    ///
    /// Cancelling `abort` terminates the process; the result then reports
    /// [`ProcessStatus::Aborted`]. Must be called from within a tokio runtime.
    fn run(&self, spec: ProcessSpec, abort: CancellationToken) -> ProcessHandle;
}

/// Pending result of a launched process
#[derive(Debug)]
pub struct ProcessHandle {
    program: String,
    abort: CancellationToken,
    completion: oneshot::Receiver<ProcessResult>,
}

impl ProcessHandle {
    /// Pair an abort token with the receiving end of a completion channel
    pub fn new(
        program: impl Into<String>,
        abort: CancellationToken,
        completion: oneshot::Receiver<ProcessResult>,
    ) -> Self {
        Self {
            program: program.into(),
            abort,
            completion,
        }
    }

    /// Handle whose result is already known
    pub fn ready(result: ProcessResult, abort: CancellationToken) -> Self {
        let (tx, rx) = oneshot::channel();
        let program = result.program.clone();
        let _ = tx.send(result);
        Self::new(program, abort, rx)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Ask the runner to terminate the process early
    pub fn abort(&self) {
        self.abort.cancel();
    }

    /// Suspend until the process has ended
    pub async fn wait(self) -> ProcessResult {
        match self.completion.await {
            Ok(result) => result,
            Err(_) => ProcessResult::launch_failed(
                self.program,
                "runner dropped the process before it reported a result",
            ),
        }
    }
}

/// Port for the playback host (the running player)
#[async_trait]
pub trait PlayerPort: Send + Sync {
    /// Snapshot of the current playback state
    async fn playback_state(&self) -> Result<PlaybackState, ClipError>;

    /// Current playback position in seconds
    async fn time_pos(&self) -> Result<f64, ClipError>;

    /// Write the demuxer cache between `start` and `end` to `path`
    async fn dump_cache(&self, start: f64, end: f64, path: &Path) -> Result<(), ClipError>;

    /// Seek to `target` snapping to keyframes and report the position reached
    async fn seek_keyframe(&self, target: f64) -> Result<f64, ClipError>;

    /// Show a short message to the user
    async fn show_text(&self, message: &str);
}

/// Port for uploading finished clips
#[async_trait]
pub trait UploadPort: Send + Sync {
    /// Upload `file` and return the public URL
    async fn upload(&self, file: &Path, host: UploadHost) -> Result<String, ClipError>;
}

/// Location of a detected encoder binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderBinary {
    pub program: String,
    pub version: String,
}
