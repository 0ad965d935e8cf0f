use std::sync::Arc;

use crate::adapters::{CurlUploadAdapter, TokioProcessRunner};
use crate::app::{clip_interactor::ClipInteractor, session_interactor::SessionInteractor};
use crate::domain::model::ClipperOptions;
use crate::ports::{PlayerPort, ProcessRunner, UploadPort};

pub trait AppContainer: Send + Sync {
    fn clip_interactor(&self) -> Arc<ClipInteractor>;
    fn uploader(&self) -> Arc<dyn UploadPort>;
    fn player(&self) -> Arc<dyn PlayerPort>;
}

/// Wires the real adapters around one player
pub struct DefaultAppContainer {
    clip_interactor: Arc<ClipInteractor>,
    uploader: Arc<dyn UploadPort>,
    player: Arc<dyn PlayerPort>,
}

impl DefaultAppContainer {
    /// Build the container, probing for an encoder once
    pub async fn new(options: ClipperOptions, player: Arc<dyn PlayerPort>) -> Self {
        let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner::new());
        let encoder = ClipInteractor::probe_encoder(runner.as_ref()).await;
        let uploader: Arc<dyn UploadPort> =
            Arc::new(CurlUploadAdapter::new(options.litterbox_retention.clone()));

        let clip_interactor = Arc::new(ClipInteractor::new(
            Arc::clone(&runner),
            Arc::clone(&player),
            options,
            encoder,
        ));

        Self {
            clip_interactor,
            uploader,
            player,
        }
    }

    /// Fresh menu session over this container's interactor
    pub fn session_interactor(&self) -> SessionInteractor {
        SessionInteractor::new(
            Arc::clone(&self.clip_interactor),
            Arc::clone(&self.player),
            Arc::clone(&self.uploader),
        )
    }
}

impl AppContainer for DefaultAppContainer {
    fn clip_interactor(&self) -> Arc<ClipInteractor> {
        Arc::clone(&self.clip_interactor)
    }

    fn uploader(&self) -> Arc<dyn UploadPort> {
        Arc::clone(&self.uploader)
    }

    fn player(&self) -> Arc<dyn PlayerPort> {
        Arc::clone(&self.player)
    }
}
