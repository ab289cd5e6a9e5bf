//! dhcpviewd - DHCP web view backend
//!
//! HTTP API for browsing and editing fixed IP reservations on ISC DHCP
//! servers reached over SSH.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dhcpview::config::{AppState, DEFAULT_CONFIG_PATH};
use dhcpview::routes;
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dhcpviewd")]
#[command(about = "DHCP web view backend - manages dhcpd.conf reservations over SSH")]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load initial configuration
    let state = AppState::new(args.config.clone())
        .with_context(|| format!("Failed to load configuration from {:?}", args.config))?;
    let config = state.config().await;

    let _guard = init_logging(config.log_dir.as_deref(), &config.tracing_filter());

    tracing::info!("Starting dhcpviewd");
    tracing::info!("Config path: {:?}", args.config);
    tracing::info!(
        "{} server(s) loaded from {:?}",
        state.inventory().await.servers().len(),
        config.servers_path
    );

    let app = routes::create_router(state.clone());

    let addr = SocketAddr::from((config.bind_address, config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("HTTP server listening on IP {} port {}", config.bind_address, config.port);

    let shutdown = Arc::new(Notify::new());
    let shutdown_clone = shutdown.clone();

    // Handle SIGHUP for config reload
    let sighup = signal(SignalKind::hangup()).context("Failed to install SIGHUP handler")?;
    tokio::spawn(handle_sighup(state.clone(), sighup));

    // Handle SIGTERM and SIGINT for graceful shutdown
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!("Received SIGTERM, shutting down");
            }
            _ = sigint.recv() => {
                tracing::info!("Received SIGINT, shutting down");
            }
        }

        shutdown_clone.notify_one();
    });

    // ConnectInfo<SocketAddr> feeds the client IP to request logging
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async move {
            shutdown.notified().await;
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Log to `<log_dir>/dhcpviewd.log` (use logrotate for rotation), or to
/// stdout without a log directory. `RUST_LOG` wins over the config.
fn init_logging(log_dir: Option<&std::path::Path>, default_filter: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    match log_dir {
        Some(dir) => {
            let file_appender = rolling::never(dir, "dhcpviewd.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_target(false)
                .init();
            None
        }
    }
}

/// Handle SIGHUP signals for configuration reload.
async fn handle_sighup(state: AppState, mut sighup: tokio::signal::unix::Signal) {
    loop {
        sighup.recv().await;
        tracing::info!("Received SIGHUP, reloading configuration");

        if let Err(e) = state.reload().await {
            tracing::error!("Failed to reload configuration: {}", e);
        }
    }
}
