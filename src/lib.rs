//! mpv-clipper library
//!
//! Clip jobs for a running mpv: the user marks start and end points, the
//! planner turns them into encoder invocations and the flow engine runs those
//! as cancellable background jobs on the host's event loop.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::errors::{ClipError, ClipResult};
pub use domain::model::{ClipType, ClipperOptions, PlaybackState, TimingWindow};
pub use engine::{FlowDriver, FlowOutcome, JobHandle, JobSlot};
