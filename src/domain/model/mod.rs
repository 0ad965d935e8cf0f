// Domain models - Core types and data structures

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ClipError;

mod options;

pub use options::{ClipperOptions, UploadHost};

/// Time specification - represents time in seconds with fractional precision
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct TimeSpec {
    pub seconds: f64,
}

impl TimeSpec {
    /// Create a new TimeSpec from seconds
    pub fn from_seconds(seconds: f64) -> Self {
        Self { seconds }
    }

    /// Parse time string in various formats
    pub fn parse(time_str: &str) -> Result<Self, ClipError> {
        let trimmed = time_str.trim();

        // Try parsing as seconds (float)
        if let Ok(seconds) = trimmed.parse::<f64>() {
            if seconds < 0.0 || !seconds.is_finite() {
                return Err(ClipError::validation("Time cannot be negative"));
            }
            return Ok(Self::from_seconds(seconds));
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        match parts.as_slice() {
            [minutes, seconds] => {
                let minutes = parse_component::<u32>(minutes, "minutes")?;
                let seconds = parse_component::<f64>(seconds, "seconds")?;
                if !(0.0..60.0).contains(&seconds) {
                    return Err(ClipError::validation("Seconds must be less than 60"));
                }
                Ok(Self::from_seconds(minutes as f64 * 60.0 + seconds))
            }
            [hours, minutes, seconds] => {
                let hours = parse_component::<u32>(hours, "hours")?;
                let minutes = parse_component::<u32>(minutes, "minutes")?;
                let seconds = parse_component::<f64>(seconds, "seconds")?;
                if minutes >= 60 {
                    return Err(ClipError::validation("Minutes must be less than 60"));
                }
                if !(0.0..60.0).contains(&seconds) {
                    return Err(ClipError::validation("Seconds must be less than 60"));
                }
                Ok(Self::from_seconds(
                    hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds,
                ))
            }
            _ => Err(ClipError::validation(format!(
                "Invalid time format '{}'. Supported formats: seconds (e.g., 123.45), MM:SS.ms (e.g., 2:30.5), HH:MM:SS.ms (e.g., 1:02:30.5)",
                trimmed
            ))),
        }
    }

    /// Format as HH:MM:SS.mmm
    pub fn format_hms(&self) -> String {
        let total_ms = (self.seconds * 1000.0).round() as u64;
        let hours = total_ms / 3_600_000;
        let minutes = (total_ms % 3_600_000) / 60_000;
        let seconds = (total_ms % 60_000) / 1000;
        let millis = total_ms % 1000;
        format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
    }
}

fn parse_component<T: FromStr>(value: &str, what: &str) -> Result<T, ClipError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| ClipError::validation(format!("Invalid {} format: '{}'", what, value)))
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_hms())
    }
}

/// User-selected clip boundary
///
/// Both ends start unset and are filled by marking actions. The window is
/// only usable once both are set and `end > start`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingWindow {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl TimingWindow {
    /// Empty window
    pub fn new() -> Self {
        Self::default()
    }

    /// Window with both bounds set
    pub fn between(start: f64, end: f64) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Mark the start bound
    pub fn set_start(&mut self, seconds: f64) {
        self.start = Some(seconds.max(0.0));
    }

    /// Mark the end bound
    pub fn set_end(&mut self, seconds: f64) {
        self.end = Some(seconds.max(0.0));
    }

    /// Clear both bounds
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Return both bounds if the window is valid
    pub fn bounds(&self) -> Result<(f64, f64), ClipError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start >= 0.0 && end > start => Ok((start, end)),
            (None, _) => Err(ClipError::validation("Start time is not set")),
            (_, None) => Err(ClipError::validation("End time is not set")),
            (Some(start), Some(end)) => Err(ClipError::validation(format!(
                "End time ({:.3}) must be after start time ({:.3})",
                end, start
            ))),
        }
    }

    /// Check the window invariant
    pub fn is_valid(&self) -> bool {
        self.bounds().is_ok()
    }

    /// Length of a valid window
    pub fn duration(&self) -> Option<f64> {
        self.bounds().ok().map(|(start, end)| end - start)
    }
}

impl fmt::Display for TimingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |value: Option<f64>| match value {
            Some(seconds) => TimeSpec::from_seconds(seconds).format_hms(),
            None => "--:--:--.---".to_string(),
        };
        write!(f, "[{} -> {}]", show(self.start), show(self.end))
    }
}

/// Kind of clip to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipType {
    Video,
    Audio,
}

impl ClipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipType::Video => "video",
            ClipType::Audio => "audio",
        }
    }
}

impl fmt::Display for ClipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClipType {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "video" | "v" => Ok(ClipType::Video),
            "audio" | "a" => Ok(ClipType::Audio),
            other => Err(ClipError::validation(format!(
                "Unknown clip type '{}'. Valid types: video, audio",
                other
            ))),
        }
    }
}

/// One external-process invocation: program plus ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    program: String,
    args: Vec<String>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append a single argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Value of the first `--name=value` argument
    pub fn option_value(&self, name: &str) -> Option<&str> {
        let prefix = format!("--{}=", name);
        self.args
            .iter()
            .find_map(|arg| arg.strip_prefix(prefix.as_str()))
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// How a process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessStatus {
    /// Process exited on its own with this code
    Exited(i32),
    /// Terminated by a signal we did not send
    Signaled,
    /// Terminated because the awaiting flow asked for it
    Aborted,
    /// Never started
    LaunchFailed(String),
}

impl ProcessStatus {
    /// Integer view: exit code, or a negative value for the non-exit cases
    pub fn code(&self) -> i32 {
        match self {
            ProcessStatus::Exited(code) => *code,
            ProcessStatus::LaunchFailed(_) => -1,
            ProcessStatus::Aborted => -2,
            ProcessStatus::Signaled => -3,
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessStatus::Exited(code) => write!(f, "exit code {}", code),
            ProcessStatus::Signaled => write!(f, "killed by signal"),
            ProcessStatus::Aborted => write!(f, "aborted"),
            ProcessStatus::LaunchFailed(reason) => write!(f, "launch failed: {}", reason),
        }
    }
}

/// Outcome of one external process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub program: String,
    pub status: ProcessStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn exited(program: impl Into<String>, code: i32, stdout: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            status: ProcessStatus::Exited(code),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn launch_failed(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            status: ProcessStatus::LaunchFailed(reason.into()),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn aborted(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            status: ProcessStatus::Aborted,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    /// Exited with code zero
    pub fn success(&self) -> bool {
        self.status == ProcessStatus::Exited(0)
    }

    /// Last non-empty line of stderr, falling back to stdout
    pub fn last_output_line(&self) -> Option<&str> {
        last_line(&self.stderr).or_else(|| last_line(&self.stdout))
    }
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}

/// Crop rectangle in source pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub width: u32,
    pub height: u32,
    pub x: u32,
    pub y: u32,
}

impl CropRect {
    pub fn new(width: u32, height: u32, x: u32, y: u32) -> Result<Self, ClipError> {
        if width == 0 || height == 0 {
            return Err(ClipError::validation("Crop dimensions cannot be zero"));
        }
        Ok(Self {
            width,
            height,
            x,
            y,
        })
    }

    /// Filter expression understood by the encoder
    pub fn filter(&self) -> String {
        format!("crop={}:{}:{}:{}", self.width, self.height, self.x, self.y)
    }
}

/// Snapshot of what the player is currently doing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackState {
    /// Path or URL of the current source
    pub path: String,
    /// Media title reported by the player
    pub title: Option<String>,
    /// Source is streamed over the network
    pub is_network: bool,
    /// Subtitle delay in seconds
    pub sub_delay: f64,
    /// Selected audio track, `None` when audio is off
    pub audio_track: Option<i64>,
    /// Selected subtitle track, `None` when subtitles are off
    pub subtitle_track: Option<i64>,
    /// Selected video track, `None` when video is off
    pub video_track: Option<i64>,
    /// External file behind the selected subtitle track. `None` when the
    /// selected track is embedded in the source.
    pub subtitle_file: Option<PathBuf>,
    /// Player volume (100 = unchanged)
    pub volume: f64,
    pub mute: bool,
    pub crop: Option<CropRect>,
}

impl PlaybackState {
    /// State for a plain local file with default tracks
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            audio_track: Some(1),
            video_track: Some(1),
            volume: 100.0,
            ..Self::default()
        }
    }

    /// Subtitles are selected, either embedded or from an external file
    pub fn has_subtitles(&self) -> bool {
        self.subtitle_track.is_some() || self.subtitle_file.is_some()
    }

    /// Selected subtitles are timed against the source, not the container
    pub fn subtitles_external(&self) -> bool {
        self.subtitle_file.is_some()
    }

    /// File name of the source without directory or extension
    pub fn file_stem(&self) -> String {
        let trimmed = self.path.trim_end_matches('/');
        let name = trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed);
        let stem = name.split('?').next().unwrap_or(name);
        match stem.rsplit_once('.') {
            Some((base, _)) if !base.is_empty() => base.to_string(),
            _ => stem.to_string(),
        }
    }
}
