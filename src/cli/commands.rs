//! Command implementations

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::adapters::{CurlUploadAdapter, LocalSourceAdapter, TokioProcessRunner, TomlConfigAdapter};
use crate::app::{AppContainer, ClipInteractor, CompletionHook, DefaultAppContainer, UploadHook};
use crate::cli::{ClipArgs, Cli, Commands, ProbeArgs, SessionArgs, UploadArgs};
use crate::domain::errors::ClipError;
use crate::domain::model::*;
use crate::engine::FlowOutcome;
use crate::ports::{PlayerPort, UploadPort};

/// Dispatch the parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    let options = load_options(&cli)?;
    match cli.command {
        Commands::Clip(args) => clip(options, args).await,
        Commands::Session(args) => session(options, args).await,
        Commands::Probe(args) => probe(options, args).await,
        Commands::Upload(args) => upload(options, args).await,
    }
}

/// Config file (or defaults) with command-line overrides applied on top
pub fn load_options(cli: &Cli) -> Result<ClipperOptions> {
    let adapter = match &cli.config {
        Some(path) => TomlConfigAdapter::with_file(path),
        None => TomlConfigAdapter::new(),
    };
    let mut options = adapter.load()?;

    if let Some(dir) = &cli.output_dir {
        options.output_dir = dir.clone();
    }
    if let Commands::Clip(args) = &cli.command {
        if args.height.is_some() {
            options.height = args.height;
        }
        if let Some(host) = args.host {
            options.upload_host = host;
        }
    }
    options.validate()?;
    Ok(options)
}

/// Execute the clip command
pub async fn clip(options: ClipperOptions, args: ClipArgs) -> Result<()> {
    let start = TimeSpec::parse(&args.start)
        .with_context(|| format!("Invalid start time '{}'", args.start))?;
    let end = TimeSpec::parse(&args.end)
        .with_context(|| format!("Invalid end time '{}'", args.end))?;
    let window = TimingWindow::between(start.seconds, end.seconds);
    window.bounds()?;

    if !args.input.is_file() {
        bail!("Input file does not exist: {}", args.input.display());
    }

    let container = DefaultAppContainer::new(options, Arc::new(local_source(&args))).await;
    let clipper = container.clip_interactor();
    if !clipper.is_ready() {
        bail!("No usable encoder found. Is mpv installed and on PATH?");
    }

    let hook: Option<Arc<dyn CompletionHook>> = args.upload.then(|| {
        Arc::new(UploadHook::new(
            container.uploader(),
            container.player(),
            clipper.options().upload_host,
        )) as Arc<dyn CompletionHook>
    });

    info!(input = %args.input.display(), window = %window, clip_type = %args.clip_type, "clipping");
    let handle = clipper.create_clip(args.clip_type, &window, hook).await?;
    let ticket = handle.ticket();
    let wait = handle.wait();
    tokio::pin!(wait);

    let outcome = tokio::select! {
        outcome = &mut wait => outcome,
        _ = tokio::signal::ctrl_c() => {
            warn!("interrupted, cancelling clip");
            ticket.cancel();
            wait.await
        }
    };

    match outcome {
        FlowOutcome::Completed(output) => {
            println!("{}", output.display());
            Ok(())
        }
        FlowOutcome::Cancelled => bail!("Clip cancelled"),
        FlowOutcome::Failed(err) => Err(err.into()),
    }
}

/// Player stand-in for the file named on the command line
fn local_source(args: &ClipArgs) -> LocalSourceAdapter {
    let source = LocalSourceAdapter::new(&args.input).with_sub_delay(args.sub_delay);
    match &args.sub_file {
        Some(sub_file) => source.with_subtitle_file(sub_file.clone()),
        None => {
            if args.sub_delay != 0.0 {
                warn!("--sub-delay has no effect without --sub-file");
            }
            source
        }
    }
}

/// Execute the session command
#[cfg(unix)]
pub async fn session(options: ClipperOptions, args: SessionArgs) -> Result<()> {
    use tokio::io::{AsyncBufReadExt, BufReader};

    use crate::adapters::MpvIpcAdapter;
    use crate::app::{MenuCommand, SessionReply};

    let player: Arc<dyn PlayerPort> = Arc::new(MpvIpcAdapter::connect(&args.socket).await?);
    let container = DefaultAppContainer::new(options, player).await;
    let clipper = container.clip_interactor();
    if !clipper.is_ready() {
        warn!("no usable encoder found; clips will not start");
    }

    let mut session = container.session_interactor();
    println!("Connected to mpv at {}. Type 'help' for commands.", args.socket.display());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<MenuCommand>() {
            Ok(command) => command,
            Err(err) => {
                println!("{}", err);
                continue;
            }
        };
        match session.handle(command).await {
            Ok(SessionReply::Quit) => break,
            Ok(reply) => println!("{}", reply),
            Err(ClipError::Player(msg)) if msg.contains("connection closed") => {
                bail!("mpv went away");
            }
            Err(err) => println!("{}", err),
        }
    }

    finish_jobs(&mut session).await;
    Ok(())
}

/// Let the session's running encodes finish before the runtime goes away,
/// unless interrupted
#[cfg(unix)]
async fn finish_jobs(session: &mut crate::app::SessionInteractor) {
    let running = session.running_jobs();
    if running > 0 {
        println!(
            "Waiting for {} running job(s) to finish. Press Ctrl-C to cancel them.",
            running
        );
    }

    let tickets = session.job_tickets();
    let wait = session.wait_for_jobs();
    tokio::pin!(wait);
    let outcomes = tokio::select! {
        outcomes = &mut wait => outcomes,
        _ = tokio::signal::ctrl_c() => {
            warn!(jobs = tickets.len(), "interrupted, cancelling running jobs");
            tickets.iter().for_each(crate::engine::JobTicket::cancel);
            wait.await
        }
    };

    for outcome in outcomes {
        match outcome {
            FlowOutcome::Completed(output) => println!("Clip saved: {}", output.display()),
            FlowOutcome::Cancelled => println!("Clip cancelled"),
            FlowOutcome::Failed(err) => println!("Clip failed: {}", err),
        }
    }
}

#[cfg(not(unix))]
pub async fn session(_options: ClipperOptions, _args: SessionArgs) -> Result<()> {
    bail!("The session command needs mpv's unix-socket IPC, which is unavailable on this platform")
}

/// Execute the probe command
pub async fn probe(options: ClipperOptions, args: ProbeArgs) -> Result<()> {
    let runner = TokioProcessRunner::new();
    let encoder = ClipInteractor::probe_encoder(&runner).await;

    if args.show_config {
        println!("{}", TomlConfigAdapter::render(&options)?);
    }
    match encoder {
        Some(encoder) => {
            println!("ready: {} ({})", encoder.program, encoder.version);
            Ok(())
        }
        None => bail!("No usable encoder found. Is mpv installed and on PATH?"),
    }
}

/// Execute the upload command
pub async fn upload(options: ClipperOptions, args: UploadArgs) -> Result<()> {
    let host = args.host.unwrap_or(options.upload_host);
    let uploader = CurlUploadAdapter::new(options.litterbox_retention.clone());
    let url = uploader.upload(&args.file, host).await?;
    println!("{}", url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_overrides_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.toml");
        std::fs::write(&config, "output_dir = \"/from/file\"\nvideo_bitrate = \"1M\"\n").unwrap();

        let cli = Cli::parse_from([
            "mpv-clipper",
            "--config",
            config.to_str().unwrap(),
            "--output-dir",
            "/from/cli",
            "probe",
        ]);
        let options = load_options(&cli).unwrap();
        assert_eq!(options.output_dir, "/from/cli");
        assert_eq!(options.video_bitrate, "1M");
    }

    #[tokio::test]
    async fn test_clip_subtitle_flags_reach_encode() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::parse_from([
            "mpv-clipper", "clip", "-i", "/videos/movie.mkv", "-s", "1", "-e", "2",
            "--sub-file", "/subs/en.srt", "--sub-delay", "0.5",
        ]);
        let Commands::Clip(args) = cli.command else {
            panic!("expected clip command");
        };

        let playback = local_source(&args).playback_state().await.unwrap();
        let options = ClipperOptions {
            output_dir: dir.path().to_string_lossy().into_owned(),
            ..ClipperOptions::default()
        };
        let plan = crate::planner::PipelinePlanner::new("mpv", options)
            .plan(&crate::planner::ClipRequest {
                clip_type: args.clip_type,
                window: TimingWindow::between(1.0, 2.0),
                playback,
            })
            .unwrap();
        let crate::planner::PipelinePlan::Direct { encode, .. } = plan else {
            panic!("expected a direct plan");
        };
        assert_eq!(encode.option_value("sub-file"), Some("/subs/en.srt"));
        assert_eq!(encode.option_value("sub-delay"), Some("0.500"));
        assert_ne!(encode.option_value("sid"), Some("no"));
    }

    #[test]
    fn test_clip_args_parse() {
        let cli = Cli::parse_from([
            "mpv-clipper", "clip", "-i", "a.mkv", "-s", "1:00", "-e", "1:05", "--type", "audio",
            "--sub-delay", "-0.5", "--height", "480",
        ]);
        let Commands::Clip(args) = cli.command else {
            panic!("expected clip command");
        };
        assert_eq!(args.clip_type, ClipType::Audio);
        assert_eq!(args.sub_delay, -0.5);
        assert_eq!(args.height, Some(480));
    }
}
