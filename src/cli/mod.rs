//! CLI module for mpv-clipper
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{ClipArgs, ProbeArgs, SessionArgs, UploadArgs};

/// mpv-clipper
///
/// Cut audio and video clips out of what mpv is playing, optionally uploading
/// them to catbox or litterbox.
#[derive(Parser, Debug)]
#[command(name = "mpv-clipper")]
#[command(about = "Clip audio and video from mpv playback")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file (default: searched in the usual config locations)
    #[arg(long, global = true, env = "MPV_CLIPPER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Logging level, overridden by RUST_LOG
    #[arg(long, default_value = "info", global = true, env = "MPV_CLIPPER_LOG_LEVEL")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "MPV_CLIPPER_LOG_JSON")]
    pub log_json: bool,

    /// Folder receiving finished clips
    #[arg(long, global = true, env = "MPV_CLIPPER_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clip a local file in one go
    Clip(ClipArgs),
    /// Interactive menu attached to a running mpv
    Session(SessionArgs),
    /// Check that an encoder is available
    Probe(ProbeArgs),
    /// Upload an existing file
    Upload(UploadArgs),
}
