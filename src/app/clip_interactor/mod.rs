// Clip interactor - Plans clip jobs and runs them as flows

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::EncoderClassifier;
use crate::engine::{FlowContext, FlowDriver, JobHandle, JobSlot};
use crate::planner::{ClipRequest, PipelinePlan, PipelinePlanner};
use crate::ports::*;

/// Encoder binaries tried in order by [`ClipInteractor::probe_encoder`]
pub const ENCODER_CANDIDATES: &[&str] = &["mpv", "mpv.com"];

/// Work run after a clip was written successfully
#[async_trait]
pub trait CompletionHook: Send + Sync {
    async fn on_complete(&self, output: &Path) -> Result<(), ClipError>;
}

/// Uploads the finished clip and shows the resulting URL
pub struct UploadHook {
    uploader: Arc<dyn UploadPort>,
    player: Arc<dyn PlayerPort>,
    host: UploadHost,
}

impl UploadHook {
    pub fn new(uploader: Arc<dyn UploadPort>, player: Arc<dyn PlayerPort>, host: UploadHost) -> Self {
        Self {
            uploader,
            player,
            host,
        }
    }
}

#[async_trait]
impl CompletionHook for UploadHook {
    async fn on_complete(&self, output: &Path) -> Result<(), ClipError> {
        self.player.show_text("Uploading clip...").await;
        match self.uploader.upload(output, self.host).await {
            Ok(url) => {
                self.player.show_text(&format!("Uploaded: {}", url)).await;
                Ok(())
            }
            Err(err) => {
                self.player.show_text(&format!("Upload failed: {}", err)).await;
                Err(err)
            }
        }
    }
}

/// Interactor for the clip use case
pub struct ClipInteractor {
    driver: FlowDriver,
    player: Arc<dyn PlayerPort>,
    planner: PipelinePlanner,
    encoder: Option<EncoderBinary>,
    slot: JobSlot,
    crop: Mutex<Option<CropRect>>,
}

impl ClipInteractor {
    /// Create the interactor; `encoder` comes from [`probe_encoder`](Self::probe_encoder)
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        player: Arc<dyn PlayerPort>,
        options: ClipperOptions,
        encoder: Option<EncoderBinary>,
    ) -> Self {
        let program = encoder
            .as_ref()
            .map(|e| e.program.clone())
            .unwrap_or_else(|| ENCODER_CANDIDATES[0].to_string());
        Self {
            driver: FlowDriver::new(runner),
            player,
            planner: PipelinePlanner::new(program, options),
            encoder,
            slot: JobSlot::new(),
            crop: Mutex::new(None),
        }
    }

    /// Replace the planner, e.g. to move cache dumps elsewhere
    pub fn with_planner(mut self, planner: PipelinePlanner) -> Self {
        self.planner = planner;
        self
    }

    /// Find a usable encoder: the first candidate whose `--version` output names mpv
    pub async fn probe_encoder(runner: &dyn ProcessRunner) -> Option<EncoderBinary> {
        for candidate in ENCODER_CANDIDATES {
            let spec = ProcessSpec::new(*candidate).arg("--version");
            let result = runner.run(spec, CancellationToken::new()).wait().await;
            if result.success() && result.stdout.contains("mpv") {
                let version = result.stdout.lines().next().unwrap_or_default().trim().to_string();
                info!(program = candidate, version = %version, "found encoder");
                return Some(EncoderBinary {
                    program: candidate.to_string(),
                    version,
                });
            }
            debug!(program = candidate, status = %result.status, "encoder candidate unusable");
        }
        warn!("no usable encoder found");
        None
    }

    /// An encoder was found at startup
    pub fn is_ready(&self) -> bool {
        self.encoder.is_some()
    }

    pub fn encoder(&self) -> Option<&EncoderBinary> {
        self.encoder.as_ref()
    }

    pub fn options(&self) -> &ClipperOptions {
        self.planner.options()
    }

    /// Crop applied to subsequent video clips
    pub fn set_crop(&self, crop: Option<CropRect>) {
        *self.crop.lock().unwrap_or_else(|p| p.into_inner()) = crop;
    }

    pub fn crop(&self) -> Option<CropRect> {
        *self.crop.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Slot holding the most recently started job
    pub fn job_slot(&self) -> &JobSlot {
        &self.slot
    }

    /// Plan a clip of `window` and start it as a new flow.
    ///
    /// Validation failures are returned (and shown on the player) before
    /// anything is launched. The new job becomes the current one; a job that
    /// was already running keeps going.
    pub async fn create_clip(
        &self,
        clip_type: ClipType,
        window: &TimingWindow,
        on_complete: Option<Arc<dyn CompletionHook>>,
    ) -> ClipResult<JobHandle<PathBuf>> {
        match self.start_clip(clip_type, window, on_complete).await {
            Ok(handle) => Ok(handle),
            Err(err) => {
                warn!(error = %err, "clip not started");
                self.player.show_text(&format!("Clip not started: {}", err)).await;
                Err(err)
            }
        }
    }

    async fn start_clip(
        &self,
        clip_type: ClipType,
        window: &TimingWindow,
        on_complete: Option<Arc<dyn CompletionHook>>,
    ) -> ClipResult<JobHandle<PathBuf>> {
        if !self.is_ready() {
            return Err(ClipError::LaunchFailure {
                program: self.planner.encoder().to_string(),
                reason: "no usable encoder was found".to_string(),
            });
        }
        // Reject a bad window before asking the player anything
        window.bounds()?;

        let mut playback = self.player.playback_state().await?;
        if let Some(crop) = self.crop() {
            playback.crop = Some(crop);
        }
        let plan = self.planner.plan(&ClipRequest {
            clip_type,
            window: *window,
            playback,
        })?;

        let player = Arc::clone(&self.player);
        let slot = self.slot.clone();
        let handle = self
            .driver
            .start(move |ctx| run_clip(ctx, plan, player, on_complete, slot));
        self.slot.replace(handle.ticket());

        self.player
            .show_text(&format!("Creating {} clip {}", clip_type, window))
            .await;
        Ok(handle)
    }

    /// Cancel the current job. Returns false when there is none.
    pub fn kill_job(&self) -> bool {
        self.slot.kill()
    }
}

/// Flow procedure of one clip job
async fn run_clip(
    ctx: FlowContext,
    plan: PipelinePlan,
    player: Arc<dyn PlayerPort>,
    on_complete: Option<Arc<dyn CompletionHook>>,
    slot: JobSlot,
) -> ClipResult<PathBuf> {
    let result = run_stages(&ctx, &plan, player.as_ref(), on_complete).await;
    slot.clear_if(ctx.job_id());

    let message = match &result {
        Ok(output) => format!("Clip saved: {}", output.display()),
        Err(err) if err.is_cancelled() || ctx.is_cancelled() => "Clip cancelled".to_string(),
        Err(err) => format!("Clip failed: {}", err),
    };
    player.show_text(&message).await;
    result
}

async fn run_stages(
    ctx: &FlowContext,
    plan: &PipelinePlan,
    player: &dyn PlayerPort,
    on_complete: Option<Arc<dyn CompletionHook>>,
) -> ClipResult<PathBuf> {
    match plan {
        PipelinePlan::Direct { encode, .. } => {
            ctx.run_checked(encode.clone(), EncoderClassifier::classify)
                .await?;
        }
        PipelinePlan::Cached { dump, recipe } => {
            ctx.suspend(player.dump_cache(dump.start, dump.end, &dump.path))
                .await?;
            let achieved = ctx.suspend(player.seek_keyframe(dump.seek_to)).await?;
            ctx.run_checked(recipe.materialize(achieved), EncoderClassifier::classify)
                .await?;
        }
    }

    let output = plan.output().to_path_buf();
    ctx.checkpoint()?;
    if let Some(hook) = on_complete {
        ctx.suspend(hook.on_complete(&output)).await?;
    }
    Ok(output)
}
