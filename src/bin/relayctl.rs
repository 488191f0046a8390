//! relayctl
//!
//! Command-line interface for switching relays on a network relay module.

use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use relaykit::{Config, Result, Session};
use tracing_subscriber::{fmt, EnvFilter};

/// relayctl
#[derive(Parser, Debug)]
#[command(name = "relayctl")]
#[command(about = "Switch relays on a network relay module")]
#[command(version)]
struct Args {
    /// Module host (defaults to RELAY_HOST or 192.168.1.240)
    #[arg(long)]
    host: Option<String>,

    /// Module port (defaults to RELAY_PORT or 8080)
    #[arg(short, long)]
    port: Option<u16>,

    /// Per-attempt timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Attempts per exchange
    #[arg(short, long)]
    retries: Option<u32>,

    /// Module number
    #[arg(short, long)]
    module: Option<u8>,

    /// Number of relays on the board (defaults to RELAY_COUNT or 16)
    #[arg(long)]
    relays: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Turn a relay on
    On {
        /// Relay number (1-based)
        relay: usize,
    },

    /// Turn a relay off
    Off {
        /// Relay number (1-based)
        relay: usize,
    },

    /// Print the state of every relay
    Status,

    /// Print whether one relay is on
    IsOn {
        /// Relay number (1-based)
        relay: usize,
    },

    /// Click every relay on and off in order
    Sweep {
        /// Pause between switches in milliseconds
        #[arg(short, long, default_value = "100")]
        delay_ms: u64,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,relaykit=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let config = build_config(&args)?;
    let mut module = Session::connect(config)?;

    match args.command {
        Commands::On { relay } => {
            module.turn_on(relay)?;
            println!("relay {}: {}", relay, on_off(module.is_on(relay)?));
        }
        Commands::Off { relay } => {
            module.turn_off(relay)?;
            println!("relay {}: {}", relay, on_off(module.is_on(relay)?));
        }
        Commands::Status => {
            println!("{}", module.relay_states());
        }
        Commands::IsOn { relay } => {
            println!("{}", module.is_on(relay)?);
        }
        Commands::Sweep { delay_ms } => {
            let delay = Duration::from_millis(delay_ms);
            for relay in 1..=module.config().number_of_relays {
                module.turn_on(relay)?;
                thread::sleep(delay);
                module.turn_off(relay)?;
                thread::sleep(delay);
            }
            println!("{}", module.relay_states());
        }
    }

    Ok(())
}

/// Environment first, then explicit flags
fn build_config(args: &Args) -> Result<Config> {
    apply_flags(args, Config::from_env()?)
}

fn apply_flags(args: &Args, mut config: Config) -> Result<Config> {
    if let Some(host) = &args.host {
        config.host = host.clone();
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    if let Some(retries) = args.retries {
        config.retry_budget = retries;
    }
    if let Some(module) = args.module {
        config.module_number = module;
    }
    if let Some(relays) = args.relays {
        config.number_of_relays = relays;
    }

    config.validate()?;
    Ok(config)
}

fn on_off(on: bool) -> &'static str {
    if on {
        "on"
    } else {
        "off"
    }
}
