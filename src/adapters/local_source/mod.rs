// Local source adapter - Player port for a plain file with no live player

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Stands in for the player when clipping a file from the command line
#[derive(Debug, Clone)]
pub struct LocalSourceAdapter {
    state: PlaybackState,
}

impl LocalSourceAdapter {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            state: PlaybackState::local(path.as_ref().to_string_lossy()),
        }
    }

    pub fn with_sub_delay(mut self, seconds: f64) -> Self {
        self.state.sub_delay = seconds;
        self
    }

    /// Load and select an external subtitle file
    pub fn with_subtitle_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.state.subtitle_file = Some(path.into());
        self
    }

    pub fn with_crop(mut self, crop: Option<CropRect>) -> Self {
        self.state.crop = crop;
        self
    }
}

#[async_trait]
impl PlayerPort for LocalSourceAdapter {
    async fn playback_state(&self) -> Result<PlaybackState, ClipError> {
        Ok(self.state.clone())
    }

    async fn time_pos(&self) -> Result<f64, ClipError> {
        Err(ClipError::Player(
            "no playback position without a running player".to_string(),
        ))
    }

    async fn dump_cache(&self, _start: f64, _end: f64, _path: &Path) -> Result<(), ClipError> {
        Err(ClipError::Player(
            "a local source has no demuxer cache".to_string(),
        ))
    }

    async fn seek_keyframe(&self, _target: f64) -> Result<f64, ClipError> {
        Err(ClipError::Player(
            "cannot seek without a running player".to_string(),
        ))
    }

    async fn show_text(&self, message: &str) {
        info!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_state_is_not_network() {
        let adapter = LocalSourceAdapter::new("/videos/movie.mkv").with_sub_delay(0.5);
        let state = adapter.playback_state().await.unwrap();
        assert_eq!(state.path, "/videos/movie.mkv");
        assert!(!state.is_network);
        assert_eq!(state.sub_delay, 0.5);
        assert_eq!(state.audio_track, Some(1));
    }

    #[tokio::test]
    async fn test_subtitle_file_is_selected() {
        let adapter = LocalSourceAdapter::new("/videos/movie.mkv")
            .with_sub_delay(0.5)
            .with_subtitle_file("/subs/en.srt");
        let state = adapter.playback_state().await.unwrap();
        assert!(state.has_subtitles());
        assert_eq!(state.subtitle_file, Some(PathBuf::from("/subs/en.srt")));
    }

    #[tokio::test]
    async fn test_cache_operations_are_unsupported() {
        let adapter = LocalSourceAdapter::new("clip.mp4");
        assert!(matches!(
            adapter.dump_cache(0.0, 1.0, Path::new("x.mkv")).await,
            Err(ClipError::Player(_))
        ));
        assert!(adapter.seek_keyframe(1.0).await.is_err());
    }
}
