// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pose_runner::config::AppConfig;
use pose_runner::data::SessionRecorder;
use pose_runner::landmarks::extract_frame;
use pose_runner::pipeline::{spawn_session, SceneCommand};
use pose_runner::session::GameSession;
use pose_runner::source::{Capture, LandmarkSource, ReplaySource, SimulatedSource};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pose_runner")]
#[command(about = "Run the pose game core on recorded or simulated landmarks")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Don't write the CSV and HTML report
    #[arg(long, global = true)]
    no_export: bool,

    /// Name of the output folder for this run
    #[arg(long, global = true)]
    session: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Play with a scripted player
    Simulate {
        #[arg(long, default_value_t = 600)]
        frames: u64,
    },

    /// Replay a JSON-lines landmark recording
    Replay { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let mut source: Box<dyn LandmarkSource> = match &cli.command {
        Command::Simulate { frames } => {
            Box::new(SimulatedSource::new(config.frame_size(), Some(*frames)))
        }
        Command::Replay { file } => Box::new(ReplaySource::open(file)?),
    };

    run(&cli, &config, source.as_mut()).await
}

async fn run(cli: &Cli, config: &AppConfig, source: &mut dyn LandmarkSource) -> Result<()> {
    let session = GameSession::new(config.scheduler());
    let recorder = SessionRecorder::new(&config.output_directory, cli.session.clone());
    info!(session = recorder.session_name(), "starting game session");

    let (handle, mut commands, task) = spawn_session(session, recorder, config.event_buffer);

    let game_over = Arc::new(AtomicBool::new(false));
    let scene = tokio::spawn({
        let game_over = Arc::clone(&game_over);
        async move {
            while let Some(command) = commands.recv().await {
                match command {
                    SceneCommand::Animate(label) => info!(%label, "switching animation"),
                    SceneCommand::Spawn(obstacle) => {
                        info!(kind = %obstacle.kind, lane = obstacle.lane, "obstacle incoming")
                    }
                    SceneCommand::Remove(id) => debug!(%id, "obstacle removed"),
                    SceneCommand::GameOver(resolution) => {
                        warn!(
                            kind = %resolution.obstacle.kind,
                            gesture = %resolution.gesture,
                            "game over"
                        );
                        game_over.store(true, Ordering::SeqCst);
                    }
                }
            }
        }
    });

    while !game_over.load(Ordering::SeqCst) {
        let Some(capture) = source.next_capture()? else {
            break;
        };

        let frame = match capture {
            Capture::Body(observation) => {
                Some(extract_frame(&observation, config.confidence_threshold))
            }
            Capture::NoBody => None,
        };
        handle.submit_frame(frame).await?;
    }

    drop(handle);
    let output = task.await.context("Session task failed")?;
    scene.await.context("Scene task failed")?;

    let metrics = output.session.metrics();
    info!(
        avg_ms = metrics.avg_processing_ms,
        max_ms = metrics.max_processing_ms,
        over_budget = metrics.over_budget_frames,
        "frame processing time"
    );

    let summary = output.recorder.summary();
    info!(
        frames = summary.frames,
        changes = summary.gesture_changes,
        spawned = summary.obstacles_spawned,
        cleared = summary.cleared,
        game_over = summary.game_over,
        "session finished"
    );

    if !cli.no_export && output.recorder.record_count() > 0 {
        let csv_path = output.recorder.export_csv()?;
        let report_path = output.recorder.generate_report()?;
        info!(csv = %csv_path.display(), report = %report_path.display(), "session exported");
    }

    Ok(())
}
