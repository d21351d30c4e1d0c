//! Murmuration - Entry Point
//!
//! Connects to the external simulator, computes one steering decision per
//! agent per tick, and publishes the decision list to subscribers.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::runtime::Runtime;

use murmuration::core::config::{EngineConfig, StrategyKind};
use murmuration::core::error::Result;
use murmuration::flock::FlockController;
use murmuration::transport::{self, TransportConfig};

#[derive(Parser, Debug)]
#[command(name = "murmuration", about = "Flocking steering decision engine")]
struct Args {
    /// Simulator request/reply address to connect to
    #[arg(long, default_value = "127.0.0.1:12346")]
    simulator: String,

    /// Address to publish decisions on
    #[arg(long, default_value = "127.0.0.1:12345")]
    publish: String,

    /// Engine configuration file (TOML); defaults apply when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Steering strategy, overriding the configuration file
    #[arg(long, value_enum)]
    strategy: Option<StrategyKind>,

    /// Grid cell size in world units, overriding the configuration file
    #[arg(long)]
    grid_step: Option<f32>,

    /// Snapshot wait timeout in seconds before the connection is recycled
    #[arg(long, default_value_t = 10)]
    timeout: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("murmuration=debug")
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }
    if let Some(grid_step) = args.grid_step {
        config.grid_step = grid_step;
    }
    config.validate()?;

    tracing::info!(strategy = ?config.strategy, grid_step = config.grid_step, "murmuration starting");

    let controller = FlockController::new(config);
    let transport_config = TransportConfig {
        simulator_addr: args.simulator,
        publish_addr: args.publish,
        snapshot_timeout: Duration::from_secs(args.timeout),
        ..TransportConfig::default()
    };

    let rt = Runtime::new()?;
    rt.block_on(transport::run(transport_config, controller))
}
