//! VPurse Bridge Server
//!
//! Hosts the VPurse bridge on a stdio pipe. The controller writes one JSON
//! request per line on stdin; replies, errors and balance broadcasts come
//! back one per line on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # Start with default settings
//! vpurse-bridge-server
//!
//! # Start with a config file carrying genesis balances
//! vpurse-bridge-server --config /path/to/config.toml
//!
//! # Start with environment overrides
//! VPURSE__BRIDGE__FLUSH_INTERVAL_MS=250 vpurse-bridge-server
//! ```

mod channel;
mod config;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vpurse_bridge::{Keeper, PortHandler, VpurseError};
use vpurse_ledger::InMemoryBank;

use crate::channel::{Frame, FrameSink};
use crate::config::ServerConfig;

// =============================================================================
// CLI Arguments
// =============================================================================

/// VPurse Bridge Server - stdio host for the controller's purse bridge
#[derive(Parser, Debug)]
#[command(name = "vpurse-bridge-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (TOML, JSON, or YAML)
    #[arg(short, long, env = "VPURSE_CONFIG")]
    config: Option<String>,

    /// Holding module account used for mint/burn staging
    #[arg(long, env = "VPURSE_MODULE_ACCOUNT")]
    module_account: Option<String>,

    /// Module account receiving fee payments
    #[arg(long, env = "VPURSE_FEE_COLLECTOR")]
    fee_collector: Option<String>,

    /// Interval between balance broadcasts, in milliseconds
    #[arg(long, env = "VPURSE_FLUSH_INTERVAL_MS")]
    flush_interval_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VPURSE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long, env = "VPURSE_LOG_FORMAT")]
    log_format: Option<String>,
}

// =============================================================================
// Main Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut server_config = ServerConfig::load(args.config.as_deref())?;

    // Override with CLI arguments
    if let Some(module_account) = args.module_account {
        server_config.bridge.module_account = module_account;
    }
    if let Some(fee_collector) = args.fee_collector {
        server_config.bridge.fee_collector = fee_collector;
    }
    if let Some(interval) = args.flush_interval_ms {
        server_config.bridge.flush_interval_ms = interval;
    }
    if let Some(level) = args.log_level {
        server_config.logging.level = level;
    }
    if let Some(format) = args.log_format {
        server_config.logging.format = format;
    }

    init_logging(&server_config.logging)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        wire_version = vpurse_types::WIRE_VERSION,
        "Starting VPurse bridge server"
    );

    server_config.validate()?;

    let bank = InMemoryBank::new();
    seed_genesis(&bank, &server_config)?;

    let sink = FrameSink::stdout();
    let keeper = Keeper::new(Arc::new(bank.clone()))
        .with_module_account(server_config.bridge.module_account()?)
        .with_fee_collector(server_config.bridge.fee_collector()?)
        .with_controller(Arc::new(sink.clone()));

    tracing::info!(
        module_account = %keeper.module_account(),
        fee_collector = %keeper.fee_collector(),
        flush_interval_ms = server_config.bridge.flush_interval_ms,
        "Bridge ready"
    );

    serve(
        &PortHandler::new(keeper),
        &bank,
        &sink,
        BufReader::new(tokio::io::stdin()),
        server_config.bridge.flush_interval(),
        shutdown_signal(),
    )
    .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

// =============================================================================
// Initialization Functions
// =============================================================================

/// Initialize logging; stdout belongs to the controller so logs go to stderr
fn init_logging(config: &config::LoggingConfig) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            subscriber
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            subscriber
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    Ok(())
}

/// Mint the configured starting balances straight into their accounts
fn seed_genesis(bank: &InMemoryBank, config: &ServerConfig) -> anyhow::Result<()> {
    for balance in &config.genesis {
        let (address, coin) = balance.parse()?;
        tracing::info!(address = %address, coin = %coin, "Seeding genesis balance");
        bank.genesis(&address, coin)?;
    }
    // Genesis is the starting state, not a change to broadcast.
    bank.take_dirty_balances();
    Ok(())
}

// =============================================================================
// Request Loop
// =============================================================================

/// Answer controller lines from `input` until EOF, shutdown or an I/O error
///
/// Every non-blank line gets exactly one reply or error frame. Changed
/// balances are broadcast on every tick and once more on the way out.
async fn serve<R>(
    handler: &PortHandler,
    bank: &InMemoryBank,
    sink: &FrameSink,
    input: R,
    flush_interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.split(b'\n');

    let mut ticker = time::interval_at(Instant::now() + flush_interval, flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tokio::pin!(shutdown);

    let result: anyhow::Result<()> = loop {
        tokio::select! {
            segment = lines.next_segment() => match segment {
                Ok(Some(raw)) => {
                    let Some(frame) = answer(handler, raw) else {
                        continue;
                    };
                    if let Err(err) = sink.send(&frame) {
                        break Err(err.into());
                    }
                }
                Ok(None) => {
                    tracing::info!("Controller closed input");
                    break Ok(());
                }
                Err(err) => {
                    tracing::error!(error = %err, "Controller input failed");
                    break Err(err.into());
                }
            },
            _ = ticker.tick() => flush(handler, bank),
            _ = &mut shutdown => break Ok(()),
        }
    };

    flush(handler, bank);
    result
}

/// Frame for one raw input line; `None` for blank lines
fn answer(handler: &PortHandler, raw: Vec<u8>) -> Option<Frame> {
    let line = match String::from_utf8(raw) {
        Ok(line) => line,
        Err(err) => {
            let err = VpurseError::malformed(format!("payload is not valid UTF-8: {}", err));
            tracing::warn!(code = err.error_code(), error = %err, "rejected controller message");
            return Some(Frame::error(&err));
        }
    };
    if line.trim().is_empty() {
        return None;
    }
    Some(match handler.receive(&line) {
        Ok(reply) => Frame::reply(&reply),
        Err(err) => Frame::error(&err),
    })
}

/// Broadcast every account balance changed since the last flush
fn flush(handler: &PortHandler, bank: &InMemoryBank) {
    let changes = bank.take_dirty_balances();
    if changes.is_empty() {
        return;
    }
    let count = changes.len();
    match handler.keeper().push_balance_updates(changes) {
        Ok(_) => tracing::debug!(balances = count, "Broadcast balance updates"),
        Err(err) => tracing::error!(
            code = err.error_code(),
            error = %err,
            balances = count,
            "Balance broadcast failed"
        ),
    }
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
