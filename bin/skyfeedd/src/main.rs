//! ---
//! sky_section: "04-daemon"
//! sky_subsection: "binary"
//! sky_type: "source"
//! sky_scope: "code"
//! sky_description: "Binary entrypoint for the SkyFeed daemon."
//! sky_version: "v0.1.0"
//! sky_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use skyfeed_api::{spawn_api_server, ApiState};
use skyfeed_common::config::AppConfig;
use skyfeed_common::logging::init_tracing;
use skyfeed_common::metrics::new_registry;
use skyfeed_sim::{EngineSettings, TelemetryEngine, Trajectory};
use tokio::signal;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    author,
    disable_version_flag = true,
    about = "SkyFeed telemetry feed daemon",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Override the RNG seed from configuration")]
    seed: Option<u64>,

    #[arg(
        short = 'V',
        long = "version",
        action = ArgAction::SetTrue,
        help = "Print version information and exit"
    )]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Serve the telemetry feed")]
    Run,
    #[command(about = "Validate configuration and trajectory dataset, then exit")]
    Check,
    #[command(about = "Print telemetry batches to stdout without serving HTTP")]
    Sample {
        /// Number of batches to produce
        #[arg(long, default_value_t = 10)]
        batches: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.version {
        println!("skyfeedd {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/skyfeed.toml"));
    candidates.push(PathBuf::from("configs/example.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let config = loaded.config;
    init_tracing("skyfeedd", &config.logging)?;
    info!(config_path = %loaded.source.display(), "configuration loaded");

    let seed = cli
        .seed
        .or(config.simulation.random_seed)
        .unwrap_or_else(rand::random);
    let settings = EngineSettings::from(&config.simulation);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_daemon(&config, settings, seed).await,
        Commands::Check => check_dataset(&config),
        Commands::Sample { batches } => sample(&config, settings, seed, batches),
    }
}

async fn run_daemon(config: &AppConfig, settings: EngineSettings, seed: u64) -> Result<()> {
    let engine = TelemetryEngine::from_path(&config.simulation.trajectory_path, settings, seed)
        .with_context(|| {
            format!(
                "failed to load trajectory dataset {}",
                config.simulation.trajectory_path.display()
            )
        })?;
    info!(
        trajectory = %config.simulation.trajectory_path.display(),
        points = engine.trajectory_len(),
        seed,
        "telemetry engine ready"
    );

    if !config.api.enabled {
        warn!("api server disabled by configuration; nothing to serve");
        return Ok(());
    }

    let registry = config.metrics.enabled.then(new_registry);
    if registry.is_none() {
        info!("metrics exporter disabled by configuration");
    }

    let state = Arc::new(ApiState::new(engine, registry)?);
    let server = spawn_api_server(state, config.api.listen).await?;
    info!(address = %server.addr(), "api server listening");

    info!("daemon running; waiting for termination signal");
    signal::ctrl_c().await?;
    info!("ctrl-c received; shutting down");
    server.shutdown().await?;

    Ok(())
}

fn check_dataset(config: &AppConfig) -> Result<()> {
    let path = &config.simulation.trajectory_path;
    let trajectory = Trajectory::from_path(path)
        .with_context(|| format!("trajectory dataset {} failed validation", path.display()))?;
    info!(trajectory = %path.display(), points = trajectory.len(), "dataset valid");
    println!(
        "Trajectory: {}\nPoints: {}",
        path.display(),
        trajectory.len()
    );
    Ok(())
}

fn sample(config: &AppConfig, settings: EngineSettings, seed: u64, batches: usize) -> Result<()> {
    let mut engine =
        TelemetryEngine::from_path(&config.simulation.trajectory_path, settings, seed)
            .with_context(|| {
                format!(
                    "failed to load trajectory dataset {}",
                    config.simulation.trajectory_path.display()
                )
            })?;
    for _ in 0..batches {
        let batch = engine.next_batch();
        let line = serde_json::to_string(&batch).context("failed to serialise batch")?;
        println!("{line}");
    }
    Ok(())
}
