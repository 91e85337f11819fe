//! # EVO State Bridge Binary
//!
//! Spawned by the control process with its stdout connected to our stdin
//! and the write end of the command pipe passed by number.
//!
//! # Usage
//!
//! ```bash
//! # Command pipe on fd 5, defaults for everything else
//! evo_bridge 5
//!
//! # Custom config, verbose JSON logs
//! evo_bridge --config /etc/evo/bridge.toml -v --json 5
//!
//! # Override region and listen address
//! evo_bridge --region /dev/shm/state --listen 127.0.0.1:9000 5
//! ```

#![deny(warnings)]

use clap::Parser;
use evo::consts::DEFAULT_CONFIG_PATH;
use evo::prelude::{BridgeConfig, ConfigLoader};
use evo_bridge::command::CommandChannel;
use evo_bridge::fd::{adopt_fd, set_blocking};
use evo_bridge::server::ObserverServer;
use evo_bridge::service::{ProcessIo, run_bridge};
use evo_bridge::{Bridge, BridgeSettings};
use evo_shared_memory::StateRegion;
use std::os::fd::RawFd;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// EVO State Bridge - relays control process state to remote observers
#[derive(Parser, Debug)]
#[command(name = "evo_bridge")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Relays control process state to WebSocket observers")]
#[command(long_about = None)]
struct Args {
    /// Write end of the command pipe, inherited from the control process
    #[arg(value_name = "COMMAND_FD")]
    command_fd: RawFd,

    /// Path to bridge configuration file (bridge.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Observer listen address, overrides the config file
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,

    /// State region path, overrides the config file
    #[arg(short, long, value_name = "PATH")]
    region: Option<PathBuf>,

    /// Descriptor carrying the control process output
    #[arg(long, value_name = "FD", default_value_t = 0)]
    input_fd: RawFd,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("FATAL: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            setup_tracing(&args, &BridgeConfig::default());
            return Err(e);
        }
    };

    setup_tracing(&args, &config);
    info!(
        "EVO Bridge v{} starting ({})",
        env!("CARGO_PKG_VERSION"),
        config.shared.service_name
    );

    let section = &config.bridge;
    let listen = section.listen_addr()?;

    let (commands, queue) = CommandChannel::new();
    let bridge = Arc::new(Bridge::new(BridgeSettings::from(section), commands));
    bridge.attach_region(StateRegion::open(&section.region_path, section.region_size))?;

    let output = adopt_fd(args.input_fd)?;
    set_blocking(&output)?;
    let command_pipe = adopt_fd(args.command_fd)?;
    info!(
        input_fd = args.input_fd,
        command_fd = args.command_fd,
        "Control process pipes adopted"
    );

    let server = ObserverServer::bind(listen, Arc::clone(&bridge)).await?;
    let io = ProcessIo {
        output,
        command_pipe,
        commands: queue,
    };
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    run_bridge(bridge, io, server, section.poll_interval(), shutdown).await?;

    info!("EVO Bridge shutdown complete");
    Ok(())
}

/// Load the config file (or defaults) and apply CLI overrides.
fn load_config(args: &Args) -> Result<BridgeConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load(path)?,
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                BridgeConfig::load(&default)?
            } else {
                BridgeConfig::default()
            }
        }
    };

    if let Some(listen) = &args.listen {
        config.bridge.listen_addr = listen.clone();
    }
    if let Some(region) = &args.region {
        config.bridge.region_path = region.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Setup tracing subscriber based on CLI arguments and config.
///
/// Logs go to stderr; stdout is left alone.
fn setup_tracing(args: &Args, config: &BridgeConfig) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from(config.shared.log_level)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
