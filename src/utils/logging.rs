//! Logging setup

use tracing_subscriber::EnvFilter;

use crate::domain::errors::ClipError;

/// Levels accepted by `--log-level`
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Build the event filter: `RUST_LOG` wins over the configured level
pub fn build_filter(level: &str) -> Result<EnvFilter, ClipError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let level = level.trim().to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        return Err(ClipError::Config(format!(
            "Invalid log level '{}'. Valid levels: {}",
            level,
            LOG_LEVELS.join(", ")
        )));
    }
    Ok(EnvFilter::new(level))
}

/// Install the global subscriber, writing to stderr so stdout stays free for
/// command output. Plain text unless `json` is set.
pub fn init_logging(level: &str, json: bool) -> Result<(), ClipError> {
    let filter = build_filter(level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ClipError::Internal(format!("cannot install logger: {}", e)))?;

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "logging initialized");
    Ok(())
}
