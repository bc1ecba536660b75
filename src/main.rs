//! lead-gateway server entry point.
//!
//! Resolves the storage backend, starts the ingest worker, and serves the
//! Axum router until Ctrl-C. Queued leads are drained before exit.

use tracing_subscriber::EnvFilter;

use lead_gateway::api;
use lead_gateway::app_state::AppState;
use lead_gateway::config::ServiceConfig;
use lead_gateway::persistence::PersistenceGateway;
use lead_gateway::service::{IngestQueue, IngestSettings, LeadRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServiceConfig::from_env()?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        backend = %config.storage_kind,
        "starting lead-gateway"
    );

    // Build persistence and service layers
    let gateway = PersistenceGateway::from_config(&config).await?;
    let (ingest, worker) =
        IngestQueue::start(gateway.clone(), IngestSettings::from_config(&config));

    // Build application state
    let app_state = AppState {
        ingest,
        repository: LeadRepository::new(gateway),
        storage_kind: config.storage_kind,
        dashboard_path: config.dashboard_path.clone(),
    };

    let app = api::build_app(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router held the last queue handles; the worker exits once the
    // channel is drained.
    tracing::info!("server stopped, draining ingest queue");
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "ingest worker did not shut down cleanly");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
