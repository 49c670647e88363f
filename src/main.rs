//! Market Recorder Binary Entry Point
//!
//! Runs recorders continuously, once, or behind the single-shot HTTP surface.
//! Core functionality is provided by the `market_recorder` library crate.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use market_recorder::{
    config::AppConfig,
    recorder::{RecorderRegistry, TickStatus},
    server::{AppState, activate, create_router},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Market Recorder - scheduled market-data capture
#[derive(Parser, Debug)]
#[command(name = "market-recorder", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        global = true,
        default_value = "configs/recorder.yaml",
        env = "RECORDER_CONFIG"
    )]
    config: String,

    /// Server bind address (overrides config file)
    #[arg(long, global = true, env = "RECORDER_SERVER_BIND")]
    server_bind: Option<String>,

    /// Server port (overrides config file)
    #[arg(long, global = true, env = "RECORDER_SERVER_PORT")]
    server_port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run every recorder continuously until SIGINT/SIGTERM (default)
    Run,
    /// Run one tick of every recorder and print the outcome as JSON
    Once,
    /// Serve the single-shot activation endpoint over HTTP
    Serve,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,market_recorder=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration from file
    tracing::info!("Loading configuration from: {}", cli.config);
    let mut config = AppConfig::load(&cli.config)?;

    // Apply CLI/env overrides (CLI > ENV > config file)
    if let Some(bind) = cli.server_bind {
        config.server.bind = bind;
    }
    if let Some(port) = cli.server_port {
        config.server.port = port;
    }
    config.validate()?;

    let recorders = config.build_recorders().await?;
    tracing::info!("Built {} recorder(s)", recorders.len());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let mut registry = RecorderRegistry::new();
            for recorder in recorders {
                registry.spawn(recorder);
            }
            tracing::info!("Press Ctrl+C to shutdown");
            shutdown_signal().await;

            tracing::info!("Shutting down recorders...");
            registry.shutdown().await;
        }
        Command::Once => {
            let state = AppState::new(recorders);
            let response = activate(&state).await;
            state.close().await;

            println!("{}", serde_json::to_string_pretty(&response)?);
            if response.status == TickStatus::Failed {
                std::process::exit(1);
            }
        }
        Command::Serve => {
            let state = AppState::new(recorders);
            let app = create_router(state.clone());

            // Parse bind address
            let addr: SocketAddr =
                format!("{}:{}", config.server.bind, config.server.port).parse()?;
            tracing::info!("Web server listening on: http://{}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            state.close().await;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
    }
}
