use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use table_sim::config::SimConfig;
use table_sim::network::Network;
use table_sim::report::Report;

/// Simulates users reading and writing shared tables under FCFS reader/writer admission
#[derive(Parser)]
#[command(name = "table_sim", version, about, long_about = None)]
struct Cli {
    /// Path to the TOML profile
    #[arg(short = 'c', long)]
    config: PathBuf,

    /// Override simulation.duration
    #[arg(long)]
    duration: Option<f64>,

    /// Override simulation.seed
    #[arg(long)]
    seed: Option<u64>,

    /// Override output.file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = SimConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load profile {}", cli.config.display()))?;
    if let Some(duration) = cli.duration {
        config.simulation.duration = duration;
    }
    if cli.seed.is_some() {
        config.simulation.seed = cli.seed;
    }
    if cli.output.is_some() {
        config.output.file = cli.output.clone();
    }
    config.validate().context("Invalid command-line override")?;

    let mut qn = Network::from_config(&config).context("Failed to build network")?;
    let summary = qn
        .run_until(config.simulation.duration)
        .context("Simulation aborted")?;

    let report = Report::collect(&qn, &summary);
    report.log_summary();
    if let Some(path) = config.output.file.as_ref() {
        report.write_json(path)?;
    }
    Ok(())
}
