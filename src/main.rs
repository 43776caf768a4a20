use anyhow::{Context, Result};
use image_analysis_service::analysis::AnalysisEngine;
use image_analysis_service::api::{start_api_server, AppState};
use image_analysis_service::blob_store::FsBlobStore;
use image_analysis_service::config::Config;
use image_analysis_service::result_store::FsResultStore;
use image_analysis_service::upload::UploadService;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        "Starting Image Analysis Service"
    );

    // Initialize metrics
    init_metrics(config.service.metrics_port)?;

    // Ensure storage directories exist before serving traffic
    tokio::fs::create_dir_all(config.storage.images_dir())
        .await
        .context("Failed to create images directory")?;
    tokio::fs::create_dir_all(config.storage.analysis_dir())
        .await
        .context("Failed to create analysis directory")?;

    // Initialize components
    let blob_store = Arc::new(FsBlobStore::new(config.storage.images_dir()));
    let result_store = Arc::new(FsResultStore::new(config.storage.analysis_dir()));
    let engine = Arc::new(AnalysisEngine::new(blob_store.clone(), result_store));
    let uploads = Arc::new(UploadService::new(blob_store, config.upload.clone()));

    let state = AppState { engine, uploads };

    // Spawn API server task
    let api_config = config.clone();
    let api_handle = tokio::spawn(async move {
        if let Err(e) = start_api_server(state, &api_config).await {
            error!(error = %e, "API server error");
        }
    });

    info!("Image analysis service started successfully");

    // Wait for shutdown signal
    shutdown_signal().await;

    info!("Shutting down image analysis service");

    api_handle.abort();

    info!("Image analysis service stopped");

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();

    builder
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
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
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
