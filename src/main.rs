#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! # whoamid
//!
//! Instance identity echo service.
//!
//! whoamid exposes a small HTTP API that tells callers which cloud instance
//! served their request, by proxying the instance-identity document from the
//! metadata endpoint and annotating it with the caller's correlation headers.
//!
//! ## API surface
//!
//! | Method | Path       | Description                                    |
//! |--------|------------|------------------------------------------------|
//! | GET    | `/`        | HTML landing page                              |
//! | GET    | `/health`  | Liveness probe                                 |
//! | GET    | `/whoami`  | Instance identity + caller correlation headers |
//!
//! ## Architecture
//!
//! ```text
//! main.rs          — entry point, clap CLI, router setup, graceful shutdown
//! config.rs        — TOML + env-var configuration
//! state.rs         — shared AppState (config + identity source)
//! imds.rs          — IdentitySource trait, IMDSv2 client
//! routes/
//!   index.rs       — GET /
//!   health.rs      — GET /health
//!   whoami.rs      — GET /whoami
//! ```

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use whoamid::imds::ImdsClient;
use whoamid::{routes, AppState, Config};

/// Instance identity echo service.
#[derive(Parser)]
#[command(name = "whoamid", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default when no subcommand given).
    Serve {
        /// Path to TOML config file.
        #[arg(long)]
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config_path = match cli.command {
        Some(Commands::Serve { config }) => config,
        None => None,
    };
    run_server(config_path.as_deref()).await;
}

async fn run_server(config_path: Option<&str>) {
    let config = Config::load(config_path);

    // Initialize tracing
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.logging.level.clone());
    tracing_subscriber::fmt().with_env_filter(log_filter).init();

    info!("whoamid v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Metadata endpoint: {}", config.imds.base_url);
    info!("Listening on {}", config.server.listen);

    let identity = Arc::new(ImdsClient::new(&config.imds));
    let state = AppState::new(config, identity);

    let app = routes::router(state.clone());

    let listener = TcpListener::bind(&state.config.server.listen)
        .await
        .expect("Failed to bind");

    info!("Server ready");

    // Graceful shutdown
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();
        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("Failed to register SIGTERM");
            tokio::select! {
                _ = ctrl_c => info!("Received SIGINT"),
                _ = sigterm.recv() => info!("Received SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            info!("Received SIGINT");
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Server error");

    info!("Goodbye");
}
