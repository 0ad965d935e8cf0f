// Clipper options - Encoding, output and upload preferences

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::errors::ClipError;

/// Litterbox retention periods accepted by the host
const LITTERBOX_RETENTIONS: &[&str] = &["1h", "12h", "24h", "72h"];

/// Which file host receives uploads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadHost {
    /// litterbox.catbox.moe, files expire
    Temporary,
    /// catbox.moe, files are kept
    Permanent,
}

impl FromStr for UploadHost {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "temporary" | "litterbox" => Ok(UploadHost::Temporary),
            "permanent" | "catbox" => Ok(UploadHost::Permanent),
            other => Err(ClipError::Config(format!(
                "Unknown upload host '{}'. Valid hosts: temporary, permanent",
                other
            ))),
        }
    }
}

impl fmt::Display for UploadHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadHost::Temporary => f.write_str("temporary"),
            UploadHost::Permanent => f.write_str("permanent"),
        }
    }
}

/// User preferences driving the planner and the upload step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipperOptions {
    /// Folder receiving finished clips, `~` is expanded
    pub output_dir: String,
    /// File name template without extension
    pub filename_template: String,
    pub video_container: String,
    pub video_codec: String,
    /// Video bitrate passed to the encoder, e.g. `3M`; empty keeps the encoder default
    pub video_bitrate: String,
    pub audio_container: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    /// Scale output to this height, keeping aspect ratio
    pub height: Option<u32>,
    /// Keep the selected subtitle track in video clips
    pub keep_subtitles: bool,
    /// Dump the network cache before encoding network streams
    pub use_cache: bool,
    /// Extra seconds dumped past the end mark
    pub cache_margin: f64,
    pub upload_host: UploadHost,
    pub litterbox_retention: String,
    /// Extra encoder arguments, whitespace separated
    pub extra_args: String,
}

impl Default for ClipperOptions {
    fn default() -> Self {
        Self {
            output_dir: "~".to_string(),
            filename_template: "{filename}-{start}-{end}".to_string(),
            video_container: "mp4".to_string(),
            video_codec: "libx264".to_string(),
            video_bitrate: "3M".to_string(),
            audio_container: "mp3".to_string(),
            audio_codec: "libmp3lame".to_string(),
            audio_bitrate: "192k".to_string(),
            height: None,
            keep_subtitles: true,
            use_cache: true,
            cache_margin: 5.0,
            upload_host: UploadHost::Temporary,
            litterbox_retention: "72h".to_string(),
            extra_args: String::new(),
        }
    }
}

impl ClipperOptions {
    /// Reject option combinations the planner cannot work with
    pub fn validate(&self) -> Result<(), ClipError> {
        if self.filename_template.trim().is_empty() {
            return Err(ClipError::Config(
                "filename_template cannot be empty".to_string(),
            ));
        }
        if self.output_dir.trim().is_empty() {
            return Err(ClipError::Config("output_dir cannot be empty".to_string()));
        }
        if self.cache_margin.is_nan() || self.cache_margin <= 0.0 {
            return Err(ClipError::Config(format!(
                "cache_margin must be positive, got {}",
                self.cache_margin
            )));
        }
        if !LITTERBOX_RETENTIONS.contains(&self.litterbox_retention.as_str()) {
            return Err(ClipError::Config(format!(
                "Invalid litterbox_retention '{}'. Valid values: {}",
                self.litterbox_retention,
                LITTERBOX_RETENTIONS.join(", ")
            )));
        }
        if self.height == Some(0) {
            return Err(ClipError::Config("height cannot be zero".to_string()));
        }
        Ok(())
    }

    /// Output directory with a leading `~` replaced by the home directory
    pub fn resolved_output_dir(&self) -> PathBuf {
        crate::utils::path::expand_home(&self.output_dir)
    }

    /// Extra encoder arguments split on whitespace
    pub fn extra_arg_list(&self) -> Vec<String> {
        self.extra_args
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}
