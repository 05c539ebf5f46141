// ============================================
// File: crates/coordnode-gateway/src/main.rs
// ============================================
//! # Coordnode Gateway Entry Point
//!
//! ## Creation Reason
//! Main entry point for the coordinator-node gateway binary.
//! Handles CLI parsing, logging setup, and gateway startup.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration loading and validation
//! - Gateway execution
//!
//! ## Usage
//! ```bash
//! coordnode start --config /etc/coordnode/gateway.toml
//! coordnode validate --config /etc/coordnode/gateway.toml
//! coordnode defaults > gateway.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `RUST_LOG` overrides `logging.level` from the config file
//! - A missing config file means defaults, not an error
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use coordnode_gateway::{Gateway, GatewayConfig};

// ============================================
// CLI Definition
// ============================================

/// Coordinator-node gateway for a wireless sensor network
#[derive(Parser, Debug)]
#[command(name = "coordnode")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway
    Start {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/coordnode/gateway.toml")]
        config: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "/etc/coordnode/gateway.toml")]
        config: PathBuf,
    },

    /// Print the default configuration
    Defaults,
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging("info");

    let result = match cli.command {
        Commands::Start { config } => cmd_start(config).await,
        Commands::Validate { config } => cmd_validate(config).await,
        Commands::Defaults => {
            print!("{}", GatewayConfig::default().to_toml());
            Ok(())
        }
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

// ============================================
// Commands
// ============================================

/// Loads configuration and runs the gateway until Ctrl+C.
async fn cmd_start(config_path: PathBuf) -> anyhow::Result<()> {
    info!("Starting coordnode gateway...");

    let config = load_or_default_config(&config_path).await?;

    // Re-initialize logging with config level
    init_logging(&config.logging.level);

    info!("════════════════════════════════════════");
    info!("Listen:        {}", config.network.listen_addr);
    info!("Concentrator:  {}", config.network.concentrator_addr);
    info!("PAN ID:        {}", config.radio.pan_id);
    info!("Nodes:         {}", config.node_addresses().len());
    info!("════════════════════════════════════════");

    let gateway = Gateway::new(config);
    gateway.run().await?;

    Ok(())
}

/// Validates a configuration file and prints a summary.
async fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    if !config_path.exists() {
        println!("⚠️  Config file not found: {}", config_path.display());
        println!("   Gateway will use default values.");
        return Ok(());
    }

    let config = GatewayConfig::load(&config_path).await?;

    println!("✅ Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:        {}", config.network.listen_addr);
    println!("   Concentrator:  {}", config.network.concentrator_addr);
    println!();
    println!("Radio:");
    println!("   PAN ID:        {}", config.radio.pan_id);
    println!("   Trailing:      {} bytes", config.radio.trailing_len);
    println!();
    println!("Nodes:");
    for addr in config.node_addresses() {
        println!("   {addr}");
    }
    match config.nodes.report_interval() {
        Some(interval) => println!("   Reporting every {}s", interval.as_secs()),
        None => println!("   Periodic reporting disabled"),
    }
    println!();
    println!("Limits:");
    println!("   Queue Depth:       {}", config.limits.queue_depth);
    println!("   Shutdown Timeout:  {}s", config.limits.shutdown_timeout_secs);
    println!();

    Ok(())
}

// ============================================
// Helpers
// ============================================

async fn load_or_default_config(path: &Path) -> anyhow::Result<GatewayConfig> {
    if path.exists() {
        Ok(GatewayConfig::load(path).await?)
    } else {
        info!("Config file not found, using defaults");
        Ok(GatewayConfig::default())
    }
}

/// Initializes the tracing subscriber.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}
