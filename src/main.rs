//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// Entry point for the venue simulator. Loads configuration (defaults, then `VENUE_*` environment
// variables and `.env`, then command line flags), runs the pipeline for the configured duration
// and prints the final top of book and latency statistics.
//--------------------------------------------------------------------------------------------------
// cargo run --release
// cargo run --release -- --producers 8 --duration-ms 5000 --drain-mode blocking
// cargo run --release -- --seed 42 --json
use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};

use venue_sim::{DrainMode, PipelineCoordinator, SimulationConfig};

/// Command line arguments. Every flag is optional and overrides the environment.
#[derive(Parser, Debug)]
#[command(author, version, about = "Single-instrument order matching venue simulator")]
struct Args {
    /// Number of order generator threads
    #[arg(short, long)]
    producers: Option<usize>,

    /// Run duration in milliseconds
    #[arg(short, long)]
    duration_ms: Option<u64>,

    /// Lowest generated price (ticks)
    #[arg(long)]
    price_min: Option<i64>,

    /// Highest generated price (ticks)
    #[arg(long)]
    price_max: Option<i64>,

    /// Smallest generated quantity
    #[arg(long)]
    qty_min: Option<u64>,

    /// Largest generated quantity
    #[arg(long)]
    qty_max: Option<u64>,

    /// Pause after each emitted order, in microseconds
    #[arg(long)]
    pause_us: Option<u64>,

    /// How the matching thread waits for orders
    #[arg(long, value_enum)]
    drain_mode: Option<DrainMode>,

    /// Base seed for the generator RNGs
    #[arg(short, long)]
    seed: Option<u64>,

    /// Print the run summary as JSON instead of the text report
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut SimulationConfig) {
        if let Some(producers) = self.producers {
            config.producers = producers;
        }
        if let Some(ms) = self.duration_ms {
            config.duration = std::time::Duration::from_millis(ms);
        }
        if let Some(min) = self.price_min {
            config.price_min = min;
        }
        if let Some(max) = self.price_max {
            config.price_max = max;
        }
        if let Some(min) = self.qty_min {
            config.quantity_min = min;
        }
        if let Some(max) = self.qty_max {
            config.quantity_max = max;
        }
        if let Some(us) = self.pause_us {
            config.producer_pause = std::time::Duration::from_micros(us);
        }
        if let Some(mode) = self.drain_mode {
            config.drain_mode = mode;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let mut config = SimulationConfig::try_from_env().context("failed to load configuration from environment")?;
    args.apply(&mut config);

    info!("Starting {} producer threads.", config.producers);
    info!("Starting 1 consumer (matching engine) thread.");
    info!("Simulation will run for {:.3} seconds.", config.duration.as_secs_f64());

    let coordinator = PipelineCoordinator::new(config).context("invalid simulation configuration")?;
    let summary = coordinator.run().context("simulation run failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{summary}");
    }

    Ok(())
}
