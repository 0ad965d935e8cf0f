// Application layer - Use case interactors

pub mod clip_interactor;
pub mod container;
pub mod session_interactor;

// Re-export interactors
pub use clip_interactor::{ClipInteractor, CompletionHook, UploadHook};
pub use container::{AppContainer, DefaultAppContainer};
pub use session_interactor::{MenuCommand, SessionInteractor, SessionReply};
