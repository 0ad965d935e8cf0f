//! mpv-clipper
//!
//! Cut audio and video clips out of mpv playback with mpv itself as the
//! encoder, optionally uploading the result.
//!
//! # Usage
//!
//! ```bash
//! mpv-clipper clip --input movie.mkv --start 1:00 --end 1:05 --type video
//! mpv-clipper session --socket /tmp/mpvsocket
//! mpv-clipper upload --file clip.mp4 --host permanent
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use mpv_clipper::cli::{commands, Cli};
use mpv_clipper::utils::logging::init_logging;

/// Single-threaded runtime: every flow step runs on this one event loop
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;
    debug!(command = ?cli.command, "starting mpv-clipper");

    if let Err(err) = commands::run(cli).await {
        error!("{:#}", err);
        return Err(err);
    }
    Ok(())
}
