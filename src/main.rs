use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context};
use set_solver::config::Config;
use set_solver::detection::{Frame, Recording, ReplayDetector};
use set_solver::error::AppResult;
use set_solver::overlay::ConsoleOverlay;
use set_solver::pipeline::{FramePipeline, PipelineConfig};
use set_solver::throttle::{FrameThrottler, ThrottleConfig};

const LOG_TARGET_STARTUP: &str = "set_solver::startup";

/// Camera cadence of the replayed stream (~30 FPS)
const FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Simulated model inference time; slower than the camera so frames get dropped
const REPLAY_LATENCY: Duration = Duration::from_millis(50);
const RENDER_TICK: Duration = Duration::from_millis(16);
const DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Built-in recording used when no file is given
const DEMO_RECORDING: &str = r#"{
  "frames": [
    { "sequence": 0, "detections": [] },
    { "sequence": 1, "detections": [
      { "label": "clg1", "bbox": { "x1": 0.05, "y1": 0.10, "x2": 0.20, "y2": 0.40, "confidence": 0.91 } },
      { "label": "clg2", "bbox": { "x1": 0.25, "y1": 0.10, "x2": 0.40, "y2": 0.40, "confidence": 0.88 } },
      { "label": "clr1", "bbox": { "x1": 0.45, "y1": 0.10, "x2": 0.60, "y2": 0.40, "confidence": 0.93 } },
      { "label": "cdg1", "bbox": { "x1": 0.05, "y1": 0.50, "x2": 0.20, "y2": 0.80, "confidence": 0.87 } },
      { "label": "rlg1", "bbox": { "x1": 0.25, "y1": 0.50, "x2": 0.40, "y2": 0.80, "confidence": 0.90 } }
    ] },
    { "sequence": 2, "detections": [
      { "label": "clg1", "bbox": { "x1": 0.05, "y1": 0.10, "x2": 0.20, "y2": 0.40, "confidence": 0.92 } },
      { "label": "joker", "bbox": { "x1": 0.25, "y1": 0.10, "x2": 0.40, "y2": 0.40, "confidence": 0.61 } },
      { "label": "rdv2", "bbox": { "x1": 0.45, "y1": 0.10, "x2": 0.60, "y2": 0.40, "confidence": 0.89 } },
      { "label": "w g r 3", "bbox": { "x1": 0.65, "y1": 0.10, "x2": 0.80, "y2": 0.40, "confidence": 0.95 } }
    ] },
    { "sequence": 3, "detections": [
      { "label": "clg1", "bbox": { "x1": 0.05, "y1": 0.10, "x2": 0.20, "y2": 0.40, "confidence": 0.92 } },
      { "label": "rdv2", "bbox": { "x1": 0.45, "y1": 0.10, "x2": 0.60, "y2": 0.40, "confidence": 0.89 } },
      { "label": "wgr3", "bbox": { "x1": 0.65, "y1": 0.10, "x2": 0.80, "y2": 0.40, "confidence": 0.95 } }
    ] }
  ]
}"#;

/// Initialize tracing with file rotation
///
/// Logs are written to:
/// - macOS: ~/Library/Application Support/SetSolver/logs/
/// - Windows: %APPDATA%/SetSolver/logs/
/// - Linux: ~/.config/SetSolver/logs/
///
/// Log output:
/// - Debug builds: Console + File
/// - Release builds: File only
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = Config::app_dir()
        .map(|dir| dir.join("logs"))
        .unwrap_or_else(|_| PathBuf::from("logs"));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "set-solver.log");

    // Configure filter (info level by default)
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn load_recording(path: Option<&str>) -> AppResult<Recording> {
    match path {
        Some(path) => Recording::load(Path::new(path))
            .with_context(|| format!("Failed to load recording {}", path)),
        None => {
            tracing::info!("No recording given, replaying built-in demo");
            Recording::from_json(DEMO_RECORDING).context("Built-in demo recording is invalid")
        }
    }
}

fn main() -> AppResult<()> {
    initialize_tracing();

    tracing::info!(
        target: LOG_TARGET_STARTUP,
        "Starting SET solver v{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::ARCH
    );

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Using default configuration: {err:#}");
            Config::default()
        }
    };
    config.validate().context("Invalid configuration")?;

    let args: Vec<String> = std::env::args().collect();
    let recording = load_recording(args.get(1).map(String::as_str))?;
    let sequences = recording.sequences();

    let detector = ReplayDetector::new(recording).with_latency(REPLAY_LATENCY);
    let pipeline = FramePipeline::with_config(Box::new(detector), PipelineConfig::from(&config));
    let (mut throttler, mut queue) = FrameThrottler::spawn(pipeline, ThrottleConfig::from(&config))
        .context("Failed to start frame pipeline")?;

    let mut overlay = ConsoleOverlay::new();

    // Camera on its own thread, this thread acts as the rendering context
    thread::scope(|scope| -> AppResult<()> {
        let camera = scope.spawn(|| -> AppResult<()> {
            for &sequence in &sequences {
                throttler.submit(Frame::blank(sequence))?;
                thread::sleep(FRAME_INTERVAL);
            }
            Ok(())
        });

        while !camera.is_finished() {
            queue.pump(&mut overlay);
            thread::sleep(RENDER_TICK);
        }

        camera
            .join()
            .map_err(|_| anyhow!("Camera thread panicked"))?
    })?;

    let last = throttler.latest_generation();
    let deadline = Instant::now() + DRAIN_TIMEOUT;
    while queue.last_applied() < last && Instant::now() < deadline {
        queue.wait_next(&mut overlay, RENDER_TICK);
    }

    throttler.shutdown();

    let stats = queue.stats();
    tracing::info!(
        "Frames: {} admitted, {} replaced, {} processed, {} shown, {} stale, {} detector failures, {} rejected labels",
        stats.admitted,
        stats.replaced,
        stats.processed,
        stats.delivered,
        stats.stale,
        stats.failed,
        stats.rejected_labels
    );

    Ok(())
}
