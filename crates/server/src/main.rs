use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fetchpack_core::{
    load_config, validate_config, Archiver, Fetcher, HttpFetcher, TaskOrchestrator, ZipArchiver,
};
use fetchpack_server::api::create_router;
use fetchpack_server::state::AppState;

/// Environment variable naming the TOML config file
const CONFIG_ENV: &str = "FETCHPACK_CONFIG";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Determine config path (optional; defaults and env vars apply without it)
    let config_path = std::env::var(CONFIG_ENV).ok().map(PathBuf::from);

    // Load configuration
    let config = load_config(config_path.as_deref())
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.mode.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &config_path {
        Some(path) => info!("Loaded configuration from {:?}", path),
        None => info!("No config file given, using defaults and environment"),
    }

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    info!("Mode: {}", config.mode);
    info!("Work directory: {:?}", config.orchestrator.work_dir);
    info!(
        "Limits: {} tasks, {} files per task, {} MB per file",
        config.orchestrator.max_tasks,
        config.orchestrator.max_files,
        config.fetcher.max_file_size_mb
    );

    tokio::fs::create_dir_all(&config.orchestrator.work_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create work directory {:?}",
                config.orchestrator.work_dir
            )
        })?;

    // Create fetcher and archiver
    let fetcher: Arc<dyn Fetcher> =
        Arc::new(HttpFetcher::new(&config.fetcher).context("Failed to create HTTP fetcher")?);
    let archiver: Arc<dyn Archiver> = Arc::new(ZipArchiver::new());

    // Create orchestrator
    let orchestrator = Arc::new(TaskOrchestrator::new(
        config.orchestrator.clone(),
        fetcher,
        archiver,
    ));

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), Arc::clone(&orchestrator)));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    orchestrator.shutdown();
    info!("Orchestrator stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
