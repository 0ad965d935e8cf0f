//! Flow engine over real processes

#![cfg(unix)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use mpv_clipper::adapters::TokioProcessRunner;
use mpv_clipper::domain::model::{ProcessSpec, ProcessStatus};
use mpv_clipper::domain::rules::EncoderClassifier;
use mpv_clipper::engine::{FlowDriver, JobSlot};
use mpv_clipper::{ClipError, FlowOutcome};

fn driver() -> FlowDriver {
    FlowDriver::new(Arc::new(TokioProcessRunner::new()))
}

fn sh(script: &str) -> ProcessSpec {
    ProcessSpec::new("sh").args(["-c", script])
}

#[tokio::test]
async fn test_steps_run_in_program_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("order.txt");
    let log_arg = log.to_string_lossy().into_owned();

    let handle = driver().start(move |ctx| async move {
        // The first step is slower, so any overlap would reorder the lines
        ctx.run(sh(&format!("sleep 0.2; echo one >> '{}'", log_arg)))
            .await?;
        ctx.run(sh(&format!("echo two >> '{}'", log_arg))).await?;
        Ok::<_, ClipError>(())
    });

    assert!(handle.wait().await.is_completed());
    assert_eq!(std::fs::read_to_string(&log).unwrap(), "one\ntwo\n");
}

#[tokio::test]
async fn test_step_result_flows_into_next_step() {
    let handle = driver().start(|ctx| async move {
        let first = ctx.run(sh("echo 7")).await?;
        let value: i32 = first.stdout.trim().parse().unwrap_or_default();
        let second = ctx.run(sh(&format!("exit {}", value * 2))).await?;
        Ok::<_, ClipError>(second.status)
    });
    assert_eq!(handle.wait().await.into_result().unwrap(), ProcessStatus::Exited(14));
}

#[tokio::test]
async fn test_classified_failure_stops_flow() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("never");
    let marker_arg = marker.to_string_lossy().into_owned();

    let handle = driver().start(move |ctx| async move {
        ctx.run_checked(sh("echo 'could not open file' >&2; exit 1"), EncoderClassifier::classify)
            .await?;
        ctx.run(sh(&format!("touch '{}'", marker_arg))).await?;
        Ok::<_, ClipError>(())
    });

    assert!(matches!(
        handle.wait().await,
        FlowOutcome::Failed(ClipError::ProcessFailure { .. })
    ));
    assert!(!marker.exists());
}

#[tokio::test]
async fn test_kill_terminates_awaited_process() {
    let slot = JobSlot::new();
    let handle = driver().start(|ctx| async move {
        ctx.run(ProcessSpec::new("sleep").arg("30")).await?;
        Ok::<_, ClipError>(())
    });
    slot.replace(handle.ticket());

    tokio::time::sleep(Duration::from_millis(100)).await;
    let started = Instant::now();
    assert!(slot.kill());

    let outcome = tokio::time::timeout(Duration::from_secs(5), handle.wait())
        .await
        .expect("cancelled flow should end promptly");
    assert!(outcome.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_missing_program_fails_flow() {
    let handle = driver().start(|ctx| async move {
        ctx.run_checked(ProcessSpec::new("nonexistent_tool_xyz_12345"), EncoderClassifier::classify)
            .await
    });
    assert!(matches!(
        handle.wait().await,
        FlowOutcome::Failed(ClipError::LaunchFailure { .. })
    ));
}
