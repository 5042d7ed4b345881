//! focusd - the focus session background service
//!
//! Loads configuration, opens the store, starts the macOS host adapter and
//! hands everything to [`focusd::Service`].

use anyhow::{Context, Result};
use clap::Parser;
use focus_host_api::OsCapability;
use focus_host_macos::MacHost;
use focus_store::{SqliteStore, Store};
use focus_util::default_config_path;
use focusd::Service;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// How often the frontmost application is sampled
const ACTIVATION_POLL: Duration = Duration::from_millis(500);

/// focusd - Focus sessions with app and website blocking
#[derive(Parser, Debug)]
#[command(name = "focusd")]
#[command(about = "Focus session service: blocks distracting apps and websites", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/focusd/config.toml)
    #[arg(short, long, env = "FOCUSD_CONFIG", default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Socket path override (or set FOCUSD_SOCKET env var)
    #[arg(short, long, env = "FOCUSD_SOCKET")]
    socket: Option<PathBuf>,

    /// Data directory override (or set FOCUSD_DATA_DIR env var)
    #[arg(short, long, env = "FOCUSD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "focusd starting");

    let mut settings = focus_config::load_config_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;

    if let Some(socket) = args.socket {
        settings.service.socket_path = socket;
    }
    if let Some(data_dir) = args.data_dir {
        settings.service.data_dir = data_dir;
    }

    info!(
        config_path = %args.config.display(),
        browsers = settings.browsers.len(),
        "Configuration loaded"
    );

    let data_dir = &settings.service.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = focus_util::database_path(data_dir);
    let store: Arc<dyn Store> = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database {:?}", db_path))?,
    );

    info!(db_path = %db_path.display(), "Store initialized");

    if !cfg!(target_os = "macos") {
        warn!("focusd drives System Events; host calls will fail on this platform");
    }

    let host = Arc::new(MacHost::new());
    let _monitor = host.start_activation_monitor(ACTIVATION_POLL);
    let host: Arc<dyn OsCapability> = host;

    let service = Service::new(&settings, host, store).await?;
    service.run(shutdown_signal()?).await
}

/// Resolves on SIGTERM, SIGINT or SIGHUP
fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>> {
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to create SIGTERM handler")?;
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to create SIGINT handler")?;
    let mut sighup = signal(SignalKind::hangup()).context("Failed to create SIGHUP handler")?;

    Ok(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully"),
            _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully"),
            _ = sighup.recv() => info!("Received SIGHUP, shutting down gracefully"),
        }
    })
}
