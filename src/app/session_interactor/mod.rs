// Session interactor - Menu actions against a running player

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::app::clip_interactor::{ClipInteractor, CompletionHook, UploadHook};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::engine::{FlowOutcome, JobHandle, JobTicket};
use crate::ports::*;

/// One menu action
#[derive(Debug, Clone, PartialEq)]
pub enum MenuCommand {
    /// Mark the start, at the given time or the current position
    Start(Option<TimeSpec>),
    /// Mark the end, at the given time or the current position
    End(Option<TimeSpec>),
    Reset,
    Crop(Option<CropRect>),
    Clip { clip_type: ClipType, upload: bool },
    Kill,
    Status,
    Help,
    Quit,
}

pub const MENU_HELP: &str = "\
start [time]        mark clip start (current position if no time)
end [time]          mark clip end (current position if no time)
reset               clear start and end
crop W H X Y        crop video clips, 'crop clear' to remove
video [upload]      create a video clip, optionally uploading it
audio [upload]      create an audio clip, optionally uploading it
kill                cancel the current job
status              show marks and the current job
quit                leave the session";

impl FromStr for MenuCommand {
    type Err = ClipError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["start"] | ["s"] => Ok(MenuCommand::Start(None)),
            ["start", t] | ["s", t] => Ok(MenuCommand::Start(Some(TimeSpec::parse(t)?))),
            ["end"] | ["e"] => Ok(MenuCommand::End(None)),
            ["end", t] | ["e", t] => Ok(MenuCommand::End(Some(TimeSpec::parse(t)?))),
            ["reset"] => Ok(MenuCommand::Reset),
            ["crop", "clear"] => Ok(MenuCommand::Crop(None)),
            ["crop", w, h, x, y] => {
                let value = |v: &str| {
                    v.parse::<u32>()
                        .map_err(|_| ClipError::validation(format!("Invalid crop value '{}'", v)))
                };
                let rect = CropRect::new(value(*w)?, value(*h)?, value(*x)?, value(*y)?)?;
                Ok(MenuCommand::Crop(Some(rect)))
            }
            [kind] => match *kind {
                "kill" => Ok(MenuCommand::Kill),
                "status" => Ok(MenuCommand::Status),
                "help" | "?" => Ok(MenuCommand::Help),
                "quit" | "q" | "exit" => Ok(MenuCommand::Quit),
                other => Ok(MenuCommand::Clip {
                    clip_type: other.parse()?,
                    upload: false,
                }),
            },
            [kind, "upload"] => Ok(MenuCommand::Clip {
                clip_type: kind.parse()?,
                upload: true,
            }),
            _ => Err(ClipError::validation(format!(
                "Unknown command '{}'. Type 'help' for a list",
                line.trim()
            ))),
        }
    }
}

/// What the session loop should do after an action
#[derive(Debug, Clone, PartialEq)]
pub enum SessionReply {
    Message(String),
    Quit,
}

impl fmt::Display for SessionReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionReply::Message(message) => f.write_str(message),
            SessionReply::Quit => f.write_str("bye"),
        }
    }
}

/// Menu state of one session: the timing window, crop selection and the
/// jobs the session started
pub struct SessionInteractor {
    clipper: Arc<ClipInteractor>,
    player: Arc<dyn PlayerPort>,
    uploader: Arc<dyn UploadPort>,
    window: TimingWindow,
    jobs: Vec<JobHandle<PathBuf>>,
}

impl SessionInteractor {
    pub fn new(
        clipper: Arc<ClipInteractor>,
        player: Arc<dyn PlayerPort>,
        uploader: Arc<dyn UploadPort>,
    ) -> Self {
        Self {
            clipper,
            player,
            uploader,
            window: TimingWindow::new(),
            jobs: Vec::new(),
        }
    }

    pub fn window(&self) -> &TimingWindow {
        &self.window
    }

    /// Apply one menu action
    pub async fn handle(&mut self, command: MenuCommand) -> ClipResult<SessionReply> {
        debug!(?command, "menu action");
        let message = match command {
            MenuCommand::Start(at) => {
                let seconds = self.position(at).await?;
                self.window.set_start(seconds);
                self.announce(format!("Start marked at {}", TimeSpec::from_seconds(seconds)))
                    .await
            }
            MenuCommand::End(at) => {
                let seconds = self.position(at).await?;
                self.window.set_end(seconds);
                self.announce(format!("End marked at {}", TimeSpec::from_seconds(seconds)))
                    .await
            }
            MenuCommand::Reset => {
                self.window.reset();
                self.announce("Marks cleared".to_string()).await
            }
            MenuCommand::Crop(rect) => {
                self.clipper.set_crop(rect);
                match rect {
                    Some(rect) => format!("Crop set to {}", rect.filter()),
                    None => "Crop cleared".to_string(),
                }
            }
            MenuCommand::Clip { clip_type, upload } => {
                let hook = upload.then(|| self.upload_hook());
                let handle = self
                    .clipper
                    .create_clip(clip_type, &self.window, hook)
                    .await?;
                self.window.reset();
                let message = format!("Started {} clip as job {}", clip_type, handle.id());
                self.jobs.retain(|job| !job.is_finished());
                self.jobs.push(handle);
                message
            }
            MenuCommand::Kill => {
                if self.clipper.kill_job() {
                    "Cancelling current job".to_string()
                } else {
                    "No job is running".to_string()
                }
            }
            MenuCommand::Status => self.status(),
            MenuCommand::Help => MENU_HELP.to_string(),
            MenuCommand::Quit => return Ok(SessionReply::Quit),
        };
        Ok(SessionReply::Message(message))
    }

    /// Jobs started in this session that are still running
    pub fn running_jobs(&self) -> usize {
        self.jobs.iter().filter(|job| !job.is_finished()).count()
    }

    /// Tickets of the session's jobs, for cancelling them while waiting
    pub fn job_tickets(&self) -> Vec<JobTicket> {
        self.jobs.iter().map(JobHandle::ticket).collect()
    }

    /// Wait for every job the session started, in start order
    pub async fn wait_for_jobs(&mut self) -> Vec<FlowOutcome<PathBuf>> {
        let jobs = std::mem::take(&mut self.jobs);
        let mut outcomes = Vec::with_capacity(jobs.len());
        for job in jobs {
            outcomes.push(job.wait().await);
        }
        outcomes
    }

    fn upload_hook(&self) -> Arc<dyn CompletionHook> {
        Arc::new(UploadHook::new(
            Arc::clone(&self.uploader),
            Arc::clone(&self.player),
            self.clipper.options().upload_host,
        ))
    }

    async fn position(&self, at: Option<TimeSpec>) -> ClipResult<f64> {
        match at {
            Some(time) => Ok(time.seconds),
            None => self.player.time_pos().await,
        }
    }

    async fn announce(&self, message: String) -> String {
        self.player.show_text(&message).await;
        message
    }

    fn status(&self) -> String {
        let job = match self.clipper.job_slot().current() {
            Some(ticket) => format!("job {} running", ticket.id()),
            None => "no job".to_string(),
        };
        let crop = self
            .clipper
            .crop()
            .map(|c| c.filter())
            .unwrap_or_else(|| "no crop".to_string());
        let encoder = match self.clipper.encoder() {
            Some(encoder) => encoder.version.as_str(),
            None => "no encoder",
        };
        format!("{} | {} | {} | {}", self.window, crop, job, encoder)
    }
}
