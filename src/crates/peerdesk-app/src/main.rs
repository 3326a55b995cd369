//! peerdesk entry point.
//!
//! Wires together the listener (controlled role), the discovery scanner,
//! and the interactive CLI (controller role), then runs until the user
//! quits or a shutdown signal arrives.
//!
//! ```text
//! main()
//!  └─ load config, init logging
//!  └─ bind listener ───────────▶ responder::run_listener (task)
//!  └─ Scanner::new(port)
//!  └─ cli::run  ── user picks peer ──▶ controller session (blocks CLI)
//! ```

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use peerdesk_app::session::responder::{self, ExecutorFactory, ScreenFactory};
use peerdesk_app::{cli, config, executor, screen};
use peerdesk_scan::Scanner;

/// Peer-to-peer remote control for LAN hosts.
#[derive(Debug, Parser)]
#[command(name = "peerdesk", version, about)]
struct Args {
    /// Port to listen on and connect to (overrides the config file).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = config::load_config().context("loading configuration")?;
    let port = args.port.unwrap_or(config.network.port);

    // RUST_LOG wins over the configured default level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.app.log_level.clone())),
        )
        .init();

    info!("peerdesk starting on {} (port {port})", std::env::consts::OS);

    // The controlled role: accept inbound sessions for the whole lifetime
    // of the process.
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| {
            format!(
                "failed to listen on port {port}; is another instance running? \
                 (use --port to pick a different one)"
            )
        })?;
    info!("listening for control sessions on :{port}");

    let stop = CancellationToken::new();
    let executors: ExecutorFactory = Arc::new(executor::new_platform_executor);
    let screens: ScreenFactory = Arc::new(screen::new_platform_capture);
    tokio::spawn(responder::run_listener(
        listener,
        executors,
        screens,
        stop.clone(),
    ));

    // Ctrl-C winds everything down.
    let signal_stop = stop.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_stop.cancel();
        }
    });

    // The controller role: interactive peer selection, one session at a time.
    cli::run(Scanner::new(port), port, stop).await?;

    info!("peerdesk stopped");
    Ok(())
}
