//! Cache-dump stage of the two-stage pipeline
//!
//! Stage one writes `[start, end + margin]` of the player's demuxer cache to a
//! local file, then seeks to `start` on a keyframe and reads back where the
//! player actually landed. Stage two trims the dump relative to that position.

use std::path::{Path, PathBuf};

use chrono::Local;

/// Player-side work of stage one
#[derive(Debug, Clone, PartialEq)]
pub struct CacheDump {
    /// First second of the dump, in source time
    pub start: f64,
    /// Last second of the dump, in source time
    pub end: f64,
    /// Local file receiving the dump
    pub path: PathBuf,
    /// Keyframe seek target used to learn the achieved position
    pub seek_to: f64,
}

impl CacheDump {
    /// Dump covering `[start, end + margin]` into a new file under `dir`
    pub fn new(start: f64, end: f64, margin: f64, dir: &Path) -> Self {
        Self {
            start,
            end: end + margin,
            path: dump_path(dir),
            seek_to: start,
        }
    }
}

/// Fresh dump file name under `dir`
pub fn dump_path(dir: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d-%H%M%S%.3f");
    dir.join(format!("mpv-clipper-cache-{}.mkv", stamp))
}

/// Trim bounds and subtitle delay re-expressed relative to the dump
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebased {
    pub start: f64,
    pub end: f64,
    pub sub_delay: f64,
}

/// Shift the window by the achieved seek position.
///
/// `start` is clamped at zero; the encoder reads a negative start as an
/// offset from the end of the file.
pub fn rebase(start: f64, end: f64, sub_delay: f64, achieved: f64) -> Rebased {
    Rebased {
        start: (start - achieved).max(0.0),
        end: end - achieved,
        sub_delay: sub_delay - achieved,
    }
}
