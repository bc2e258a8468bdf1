//! GPU timer demo entry point.
//!
//! Drives a simulated render loop (frame setup, shadow, main, and post
//! passes) through the checkpoint engine and reports per-edge interval
//! statistics.

mod report;

use anyhow::{Context, Result};
use clap::Parser;
use gpu_timer_common::config::TimerConfig;
use gpu_timer_core::{GpuTimer, SharedIntervalMetrics, SimulatedQueries};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::report::{checkpoint_times, format_text, DemoReport, EdgeReport};

/// Checkpoints visited by every frame, in order.
const PASSES: [&str; 4] = ["frame", "shadow", "main", "post"];

/// Nominal GPU cost of the work following each checkpoint in [`PASSES`].
const PASS_COST_NS: [u64; 4] = [300_000, 2_000_000, 6_500_000, 1_500_000];

/// Every this many frames the main pass takes twice as long.
const SPIKE_PERIOD: u64 = 97;

/// GPU timer demo command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "gpu-timer-demo",
    about = "GPU timer demo - asynchronous checkpoint timing over a simulated render loop",
    version,
    long_about = None
)]
struct Args {
    /// Path to a timer configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of frames to render.
    #[arg(long, short = 'f', default_value = "600")]
    frames: u64,

    /// Result latency of the simulated GPU, in ended queries.
    #[arg(long, default_value = "2")]
    latency: u64,

    /// Initial query ring size (overrides config file).
    #[arg(long, value_name = "N")]
    slots: Option<usize>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting GPU timer demo");

    let mut config = load_config(&args)?;
    if let Some(slots) = args.slots {
        config.query_slots = slots;
        config.max_query_slots = config.max_query_slots.max(slots);
    }

    info!(
        query_slots = config.query_slots,
        overrun = ?config.overrun,
        budget = %humantime::format_duration(config.metrics.budget),
        "Configuration loaded"
    );

    let report = run_frames(config, args.frames, args.latency)?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        print!("{}", format_text(&report));
    }

    Ok(())
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("gpu_timer_demo={level},gpu_timer_core={level},gpu_timer_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority:
/// 1. Command-line `--config` argument
/// 2. `GPU_TIMER_CONFIG` environment variable
/// 3. Built-in defaults
fn load_config(args: &Args) -> Result<TimerConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return TimerConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()));
    }

    if let Ok(env_path) = std::env::var("GPU_TIMER_CONFIG") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from GPU_TIMER_CONFIG");
            return TimerConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from GPU_TIMER_CONFIG={env_path}")
            });
        }
        warn!(
            path = %env_path,
            "GPU_TIMER_CONFIG set but file does not exist, using defaults"
        );
    }

    info!("No config file given, using built-in defaults");
    Ok(TimerConfig::default())
}

/// Planned GPU durations for the four intervals of `frame`, in end order.
fn planned_durations(frame: u64) -> [u64; 4] {
    let wobble = (frame * 7_919) % 13;
    let mut durations = PASS_COST_NS.map(|ns| ns + ns * wobble / 24);
    if frame % SPIKE_PERIOD == SPIKE_PERIOD - 1 {
        durations[2] *= 2;
    }
    durations
}

/// Render `frames` frames and collect the report.
fn run_frames(config: TimerConfig, frames: u64, latency: u64) -> Result<DemoReport> {
    let mut timer = GpuTimer::new(SimulatedQueries::with_latency(latency), config)
        .context("Failed to create timer")?;
    let frame_budget = timer.config().metrics.budget.as_secs_f64();

    let mut edges: Vec<(&str, &str, SharedIntervalMetrics)> = Vec::new();
    for pair in PASSES.windows(2) {
        let metrics = timer.track(pair[0], pair[1])?;
        edges.push((pair[0], pair[1], metrics));
    }
    edges.push(("frame", "post", timer.track("frame", "post")?));
    edges.push(("post", "frame", timer.track("post", "frame")?));

    // Self edge: time between consecutive frame starts
    timer.add_callback("frame", "frame", move |_: &str, _: &str, seconds: f64| {
        if seconds > frame_budget {
            warn!(frame_ms = seconds * 1e3, "Frame over budget");
        } else {
            debug!(frame_ms = seconds * 1e3, "Frame complete");
        }
    })?;

    for frame in 0..frames {
        timer.backend_mut().push_durations_ns(planned_durations(frame));
        for pass in PASSES {
            timer
                .checkpoint(pass)
                .with_context(|| format!("Checkpoint {pass} failed in frame {frame}"))?;
        }

        if frame > 0 && frame % 100 == 0 {
            let snapshot = timer.snapshot();
            info!(
                frame,
                gpu_time_s = snapshot.total_time_s,
                pending = snapshot.pending,
                capacity = snapshot.capacity,
                "Periodic status"
            );
        }
    }

    // Close the last frame, wait for the device, then drain what is left
    if frames > 0 {
        timer.checkpoint(PASSES[0])?;
        timer.backend_mut().flush();
        timer.checkpoint(PASSES[0])?;
    }

    let snapshot = timer.snapshot();
    info!(
        frames,
        checkpoints = snapshot.checkpoints,
        drained = snapshot.drained_queries,
        dropped = snapshot.dropped_queries,
        "Render loop complete"
    );

    let percentiles = &timer.config().metrics.percentiles;
    let edges = edges
        .iter()
        .map(|(from, to, metrics)| EdgeReport::from_metrics(from, to, &metrics.borrow(), percentiles))
        .collect();

    Ok(DemoReport {
        frames,
        timer: snapshot,
        edges,
        checkpoints: checkpoint_times(timer.ledger()),
    })
}
