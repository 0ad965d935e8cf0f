// Domain errors - Error taxonomy for clip jobs

use thiserror::Error;

/// Errors surfaced by planning and running clip jobs
///
/// None of these are fatal to the host: a failed or cancelled job leaves the
/// application ready to start the next one.
#[derive(Error, Debug)]
pub enum ClipError {
    /// The process could not be started at all (missing binary, spawn error)
    #[error("Could not launch {program}: {reason}")]
    LaunchFailure { program: String, reason: String },

    /// The process ran but reported failure through its status or output
    #[error("{program} failed ({status}): {detail}")]
    ProcessFailure {
        program: String,
        status: String,
        detail: String,
    },

    /// Request rejected before anything was launched
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The job was cancelled by the user
    #[error("Job cancelled")]
    Cancelled,

    /// Upload to the file host failed
    #[error("Upload failed: {0}")]
    Upload(String),

    /// Player host refused or failed a command
    #[error("Player error: {0}")]
    Player(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// A flow ended without reporting an outcome
    #[error("Internal error: {0}")]
    Internal(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClipError {
    /// Build a validation error from anything printable
    pub fn validation(message: impl Into<String>) -> Self {
        ClipError::Validation(message.into())
    }

    /// True for user-initiated cancellation, which is not reported as a fault
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClipError::Cancelled)
    }
}

/// Result type alias for clip operations
pub type ClipResult<T> = std::result::Result<T, ClipError>;
