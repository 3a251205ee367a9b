//! Demo Copilot API server entry point.

use std::error::Error;
use std::sync::Arc;

use democopilot_api::config::ServerConfig;
use democopilot_api::rehearsal::RehearsalProvider;
use democopilot_api::state::AppState;
use democopilot_core::clock::SystemClock;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting Demo Copilot API server");

    // Read configuration from environment.
    let config = ServerConfig::from_env()?;
    let addr = config.addr()?;
    tracing::info!(
        script_dir = %config.script_dir.display(),
        action_latency_ms = u64::try_from(config.action_latency.as_millis()).unwrap_or(u64::MAX),
        "running with rehearsal collaborators"
    );

    // Build application state.
    let provider = RehearsalProvider::new(config.action_latency, config.engine.clone());
    let app_state = AppState::with_provider(
        Arc::new(provider),
        Arc::new(SystemClock),
        config.engine,
        config.script_dir,
    );
    let coordinator = Arc::clone(&app_state.coordinator);

    // Build router.
    let app = democopilot_api::app(app_state);

    // Start server.
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Stopping all sessions");
    coordinator.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
