//! Pipeline planning
//!
//! Turns a clip request into the stages a flow executes. Local sources and
//! network sources without caching get a single encode; network sources with
//! caching get a cache dump whose encode is only built once the dump's seek
//! position is known.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::utils::path::{output_path, TemplateValues};

pub mod cache;
pub mod strategy;

pub use cache::{rebase, CacheDump, Rebased};
pub use strategy::{audio_args, encode_spec, video_args, EncodeInput};

/// What the caller wants clipped
#[derive(Debug, Clone)]
pub struct ClipRequest {
    pub clip_type: ClipType,
    pub window: TimingWindow,
    pub playback: PlaybackState,
}

/// Deferred stage-two encode of a cached plan
#[derive(Debug, Clone)]
pub struct EncodeRecipe {
    encoder: String,
    clip_type: ClipType,
    /// Dump file the encode reads
    source: PathBuf,
    start: f64,
    end: f64,
    playback: PlaybackState,
    options: ClipperOptions,
    output: PathBuf,
}

impl EncodeRecipe {
    /// Encode command once the dump's achieved position is known.
    ///
    /// Embedded subtitles travel inside the dump, so only an external
    /// subtitle file needs its delay shifted.
    pub fn materialize(&self, achieved: f64) -> ProcessSpec {
        let mut rebased = rebase(self.start, self.end, self.playback.sub_delay, achieved);
        if !self.playback.subtitles_external() {
            rebased.sub_delay = self.playback.sub_delay;
        }
        let source = self.source.to_string_lossy();
        debug!(
            achieved,
            start = rebased.start,
            end = rebased.end,
            sub_delay = rebased.sub_delay,
            "rebased window onto cache dump"
        );
        encode_spec(
            &self.encoder,
            self.clip_type,
            &EncodeInput {
                source: &source,
                start: rebased.start,
                end: rebased.end,
                sub_delay: rebased.sub_delay,
                playback: &self.playback,
                options: &self.options,
                output: &self.output,
            },
        )
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

/// Ordered stages of one clip job
#[derive(Debug, Clone)]
pub enum PipelinePlan {
    /// One encode straight from the source
    Direct { encode: ProcessSpec, output: PathBuf },
    /// Dump the player cache, then encode the dump
    Cached { dump: CacheDump, recipe: EncodeRecipe },
}

impl PipelinePlan {
    /// File the finished clip is written to
    pub fn output(&self) -> &Path {
        match self {
            PipelinePlan::Direct { output, .. } => output,
            PipelinePlan::Cached { recipe, .. } => &recipe.output,
        }
    }

    pub fn stage_count(&self) -> usize {
        match self {
            PipelinePlan::Direct { .. } => 1,
            PipelinePlan::Cached { .. } => 2,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, PipelinePlan::Cached { .. })
    }
}

/// Builds pipeline plans from requests and the configured options
#[derive(Debug, Clone)]
pub struct PipelinePlanner {
    encoder: String,
    options: ClipperOptions,
    cache_dir: PathBuf,
}

impl PipelinePlanner {
    pub fn new(encoder: impl Into<String>, options: ClipperOptions) -> Self {
        Self {
            encoder: encoder.into(),
            options,
            cache_dir: std::env::temp_dir(),
        }
    }

    /// Directory receiving cache dumps (the system temp dir by default)
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    pub fn options(&self) -> &ClipperOptions {
        &self.options
    }

    pub fn encoder(&self) -> &str {
        &self.encoder
    }

    /// Validate `request` and build its plan. Nothing is launched here.
    pub fn plan(&self, request: &ClipRequest) -> ClipResult<PipelinePlan> {
        let (start, end) = request.window.bounds()?;
        let playback = &request.playback;
        if playback.path.trim().is_empty() {
            return Err(ClipError::validation("No source is loaded"));
        }

        let output_dir = self.options.resolved_output_dir();
        if !output_dir.is_dir() {
            return Err(ClipError::validation(format!(
                "Output directory does not exist: {}",
                output_dir.display()
            )));
        }
        let output = self.output_file(&output_dir, request.clip_type, playback, start, end);

        let plan = if playback.is_network && self.options.use_cache {
            let dump = CacheDump::new(start, end, self.options.cache_margin, &self.cache_dir);
            let recipe = EncodeRecipe {
                encoder: self.encoder.clone(),
                clip_type: request.clip_type,
                source: dump.path.clone(),
                start,
                end,
                playback: playback.clone(),
                options: self.options.clone(),
                output,
            };
            PipelinePlan::Cached { dump, recipe }
        } else {
            let encode = encode_spec(
                &self.encoder,
                request.clip_type,
                &EncodeInput {
                    source: &playback.path,
                    start,
                    end,
                    sub_delay: playback.sub_delay,
                    playback,
                    options: &self.options,
                    output: &output,
                },
            );
            PipelinePlan::Direct { encode, output }
        };

        info!(
            clip_type = %request.clip_type,
            window = %request.window,
            stages = plan.stage_count(),
            output = %plan.output().display(),
            "planned clip"
        );
        Ok(plan)
    }

    fn output_file(
        &self,
        dir: &Path,
        clip_type: ClipType,
        playback: &PlaybackState,
        start: f64,
        end: f64,
    ) -> PathBuf {
        let filename = playback.file_stem();
        let title = playback.title.clone().unwrap_or_else(|| filename.clone());
        let values = TemplateValues::new(&filename, &title, start, end);
        let extension = match clip_type {
            ClipType::Video => &self.options.video_container,
            ClipType::Audio => &self.options.audio_container,
        };
        output_path(dir, &self.options.filename_template, &values, extension)
    }
}
