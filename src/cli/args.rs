//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

use crate::domain::model::{ClipType, UploadHost};

/// Arguments for the clip command
#[derive(Args, Debug)]
pub struct ClipArgs {
    /// Input media file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Start time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub start: String,

    /// End time (HH:MM:SS.ms, MM:SS.ms, or seconds)
    #[arg(short, long)]
    pub end: String,

    /// Kind of clip
    #[arg(short = 't', long = "type", default_value = "video")]
    pub clip_type: ClipType,

    /// Subtitle delay in seconds
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    pub sub_delay: f64,

    /// External subtitle file to burn in
    #[arg(long)]
    pub sub_file: Option<PathBuf>,

    /// Scale video clips to this height
    #[arg(long, env = "MPV_CLIPPER_HEIGHT")]
    pub height: Option<u32>,

    /// Upload the clip when it is done
    #[arg(long)]
    pub upload: bool,

    /// Upload destination (default from config)
    #[arg(long)]
    pub host: Option<UploadHost>,
}

/// Arguments for the session command
#[derive(Args, Debug)]
pub struct SessionArgs {
    /// mpv IPC socket (`--input-ipc-server` of the running player)
    #[arg(long, env = "MPV_CLIPPER_SOCKET")]
    pub socket: PathBuf,
}

/// Arguments for the probe command
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Also print the effective configuration
    #[arg(long)]
    pub show_config: bool,
}

/// Arguments for the upload command
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// File to upload
    #[arg(short, long)]
    pub file: PathBuf,

    /// Upload destination (default from config)
    #[arg(long)]
    pub host: Option<UploadHost>,
}
