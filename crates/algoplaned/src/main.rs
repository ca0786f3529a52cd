//! algoplaned — the algoplane daemon.
//!
//! Single binary that assembles the control plane:
//! - Desired-state store (redb)
//! - Workload controller (kubectl)
//! - Reconciliation loop
//! - REST API
//!
//! # Usage
//!
//! ```text
//! algoplaned --port 8080 --data-dir /var/lib/algoplane --sync-interval 300
//! ```

mod config;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use crate::config::{DaemonConfig, Settings};

#[derive(Parser)]
#[command(name = "algoplaned", about = "Algoplane control plane daemon")]
struct Cli {
    /// Optional TOML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port the REST API listens on.
    #[arg(long)]
    port: Option<u16>,

    /// Data directory for persistent state.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Reconciliation interval in seconds.
    #[arg(long)]
    sync_interval: Option<u64>,

    /// kubectl binary to drive the orchestrator with.
    #[arg(long)]
    kubectl: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,algoplaned=debug,algoplane=debug".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let file = match &cli.config {
        Some(path) => DaemonConfig::from_file(path)?,
        None => DaemonConfig::default(),
    };
    let settings = Settings::resolve(file, cli.port, cli.data_dir, cli.sync_interval, cli.kubectl);

    run(settings).await
}

async fn run(settings: Settings) -> anyhow::Result<()> {
    info!("algoplane daemon starting");

    // Ensure data directory exists.
    std::fs::create_dir_all(&settings.data_dir)?;
    let db_path = settings.data_dir.join("algoplane.redb");

    // ── Initialize subsystems ──────────────────────────────────

    // Desired-state store.
    let store = algoplane_state::StateStore::open(&db_path)?;
    info!(path = ?db_path, "state store opened");

    // Workload controller.
    let controller = algoplane_kube::KubectlController::new(settings.kubectl_bin.clone());
    info!(kubectl = ?settings.kubectl_bin, "workload controller initialized");

    // Reconciler.
    let reconciler =
        algoplane_sync::Reconciler::new(store.clone(), controller, settings.sync_interval);

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Start background tasks ─────────────────────────────────

    let sync_handle = tokio::spawn(reconciler.run(shutdown_rx));

    // ── Start API server ───────────────────────────────────────

    let router = algoplane_api::build_router(store);
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install CTRL+C handler");
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    // Wait for the reconciler to finish its current tick.
    let _ = sync_handle.await;

    info!("algoplane daemon stopped");
    Ok(())
}
