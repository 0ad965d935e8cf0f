//! Scripted fakes for the process and player boundaries

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use mpv_clipper::app::{ClipInteractor, CompletionHook};
use mpv_clipper::domain::model::*;
use mpv_clipper::ports::*;
use mpv_clipper::ClipError;

/// How the fake runner answers one launch
#[derive(Debug, Clone)]
pub enum Reply {
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// Never finishes on its own; ends only when aborted
    Hang,
}

impl Reply {
    pub fn ok() -> Self {
        Reply::exit(0, "")
    }

    pub fn exit(code: i32, stderr: &str) -> Self {
        Reply::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Process runner answering from a script, recording every launch
pub struct FakeRunner {
    script: Mutex<VecDeque<Reply>>,
    fallback: Reply,
    launched: Mutex<Vec<ProcessSpec>>,
    aborted: Arc<AtomicUsize>,
}

impl FakeRunner {
    pub fn new(script: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            fallback: Reply::ok(),
            launched: Mutex::new(Vec::new()),
            aborted: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn launched(&self) -> Vec<ProcessSpec> {
        self.launched.lock().unwrap().clone()
    }

    pub fn aborted(&self) -> usize {
        self.aborted.load(Ordering::SeqCst)
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, spec: ProcessSpec, abort: CancellationToken) -> ProcessHandle {
        self.launched.lock().unwrap().push(spec.clone());
        let reply = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        let program = spec.program().to_string();

        match reply {
            Reply::Exit {
                code,
                stdout,
                stderr,
            } => ProcessHandle::ready(
                ProcessResult::exited(program, code, stdout).with_stderr(stderr),
                abort,
            ),
            Reply::Hang => {
                let (tx, rx) = oneshot::channel();
                let token = abort.clone();
                let aborted = Arc::clone(&self.aborted);
                let name = program.clone();
                tokio::spawn(async move {
                    token.cancelled().await;
                    aborted.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(ProcessResult::aborted(name));
                });
                ProcessHandle::new(program, abort, rx)
            }
        }
    }
}

/// Player with a fixed state that records what it was asked to do
pub struct FakePlayer {
    state: PlaybackState,
    position: f64,
    achieved: f64,
    hold_dump: bool,
    dumps: Mutex<Vec<(f64, f64, PathBuf)>>,
    seeks: Mutex<Vec<f64>>,
    messages: Mutex<Vec<String>>,
}

impl FakePlayer {
    pub fn new(state: PlaybackState) -> Self {
        Self {
            state,
            position: 0.0,
            achieved: 0.0,
            hold_dump: false,
            dumps: Mutex::new(Vec::new()),
            seeks: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
        }
    }

    /// Position reported after a keyframe seek
    pub fn achieving(mut self, achieved: f64) -> Self {
        self.achieved = achieved;
        self
    }

    /// Current playback position
    pub fn at(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    /// Cache dumps never finish
    pub fn holding_dump(mut self) -> Self {
        self.hold_dump = true;
        self
    }

    pub fn dumps(&self) -> Vec<(f64, f64, PathBuf)> {
        self.dumps.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.seeks.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlayerPort for FakePlayer {
    async fn playback_state(&self) -> Result<PlaybackState, ClipError> {
        Ok(self.state.clone())
    }

    async fn time_pos(&self) -> Result<f64, ClipError> {
        Ok(self.position)
    }

    async fn dump_cache(&self, start: f64, end: f64, path: &Path) -> Result<(), ClipError> {
        self.dumps
            .lock()
            .unwrap()
            .push((start, end, path.to_path_buf()));
        if self.hold_dump {
            std::future::pending::<()>().await;
        }
        Ok(())
    }

    async fn seek_keyframe(&self, target: f64) -> Result<f64, ClipError> {
        self.seeks.lock().unwrap().push(target);
        Ok(self.achieved)
    }

    async fn show_text(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

/// Completion hook counting its calls
#[derive(Default)]
pub struct RecordingHook {
    calls: Mutex<Vec<PathBuf>>,
}

impl RecordingHook {
    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionHook for RecordingHook {
    async fn on_complete(&self, output: &Path) -> Result<(), ClipError> {
        self.calls.lock().unwrap().push(output.to_path_buf());
        Ok(())
    }
}

/// Upload port that never touches the network
#[derive(Default)]
pub struct FakeUploader {
    uploads: Mutex<Vec<(PathBuf, UploadHost)>>,
}

impl FakeUploader {
    pub fn uploads(&self) -> Vec<(PathBuf, UploadHost)> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl UploadPort for FakeUploader {
    async fn upload(&self, file: &Path, host: UploadHost) -> Result<String, ClipError> {
        self.uploads.lock().unwrap().push((file.to_path_buf(), host));
        Ok("https://files.example/abc.mp4".to_string())
    }
}

pub fn options_in(dir: &Path) -> ClipperOptions {
    ClipperOptions {
        output_dir: dir.to_string_lossy().into_owned(),
        ..ClipperOptions::default()
    }
}

pub fn mpv() -> EncoderBinary {
    EncoderBinary {
        program: "mpv".to_string(),
        version: "mpv 0.37.0".to_string(),
    }
}

/// Interactor over the fakes with an encoder already found
pub fn clipper(runner: Arc<FakeRunner>, player: Arc<FakePlayer>, dir: &Path) -> ClipInteractor {
    let planner = mpv_clipper::planner::PipelinePlanner::new("mpv", options_in(dir)).with_cache_dir(dir);
    ClipInteractor::new(runner, player, options_in(dir), Some(mpv())).with_planner(planner)
}

/// Let spawned flows run until `done` holds
pub async fn settle(done: impl Fn() -> bool) {
    for _ in 0..100 {
        if done() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
