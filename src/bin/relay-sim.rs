//! relay-sim
//!
//! Runs a simulated relay module on a local TCP port.

use clap::Parser;
use relaykit::config::MAX_RELAYS;
use relaykit::network::Simulator;
use tracing_subscriber::{fmt, EnvFilter};

/// relay-sim
#[derive(Parser, Debug)]
#[command(name = "relay-sim")]
#[command(about = "Simulated network relay module")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Module number to answer to
    #[arg(short, long, default_value = "1")]
    module: u8,

    /// Number of relays on the simulated board
    #[arg(short, long, default_value = "16")]
    relays: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,relaykit=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    if args.relays == 0 || args.relays > MAX_RELAYS {
        tracing::error!("--relays must be in 1..={}", MAX_RELAYS);
        std::process::exit(1);
    }

    tracing::info!("relay-sim v{}", relaykit::VERSION);

    let simulator = match Simulator::bind(&args.listen, args.module, args.relays) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = simulator.run() {
        tracing::error!("Simulator error: {}", e);
        std::process::exit(1);
    }
}
