//! FishFlow API Server
//!
//! Serves movement and depth-occupancy scenarios from a local data directory
//! or an S3-compatible bucket.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use fishflow_api::build_router;
use fishflow_api::config::ServiceConfig;
use fishflow_api::state::AppState;
use storage::{BackendConfig, ObjectStorageConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Backend {
    /// Directory tree on the local filesystem
    Local,
    /// S3-compatible object store
    S3,
}

/// FishFlow API Server
#[derive(Parser, Debug)]
#[command(name = "fishflow-api")]
#[command(about = "Query service for fish movement, habitat and depth-occupancy scenarios")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:8000", env = "FISHFLOW_LISTEN_ADDR")]
    listen: String,

    /// Storage backend
    #[arg(long, value_enum, default_value = "local", env = "FISHFLOW_BACKEND")]
    backend: Backend,

    /// Root directory of the local backend
    #[arg(long, default_value = "./data", env = "FISHFLOW_DATA_DIR")]
    data_dir: PathBuf,

    /// Optional YAML service config
    #[arg(long, env = "FISHFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Number of worker threads
    #[arg(long, env = "FISHFLOW_WORKER_THREADS")]
    worker_threads: Option<usize>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();

    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(run_server(args))
}

async fn run_server(args: Args) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .json()
        .init();

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    info!("Starting FishFlow API server");

    let config = ServiceConfig::load(args.config.as_deref())?;

    let backend_config = match args.backend {
        Backend::Local => BackendConfig::Local {
            root: args.data_dir.clone(),
        },
        Backend::S3 => BackendConfig::ObjectStore(ObjectStorageConfig::from_env()),
    };
    let backend = backend_config.build()?;
    info!(backend = %backend.describe(), "Storage backend ready");

    let state = Arc::new(AppState::new(backend, config).await.with_prometheus(prometheus_handle));

    let app = build_router(state);

    let addr: SocketAddr = args
        .listen
        .parse()
        .with_context(|| format!("Invalid listen address: {}", args.listen))?;

    info!("FishFlow API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server failed")?;

    Ok(())
}
