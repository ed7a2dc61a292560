// =============================================================================
// Kline Dashboard — Main Entry Point
// =============================================================================
//
// Loads the dashboard config, performs the initial load of every container,
// starts the refresh loops and serves the page + API until Ctrl+C.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod api_client;
mod app_state;
mod chart;
mod dashboard;
mod error;
mod i18n;
mod market_data;
mod runtime_config;
mod types;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::ApiState;
use crate::api_client::ApiClient;
use crate::app_state::AppState;
use crate::dashboard::DashboardController;
use crate::runtime_config::DashboardConfig;

const CONFIG_PATH: &str = "dashboard_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Kline Dashboard — starting up");

    let mut config = DashboardConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        DashboardConfig::default()
    });
    config.apply_env_overrides();

    info!(
        coin = %config.coin,
        klines_url = %config.api.klines_url,
        resolution = %config.default_resolution,
        "Dashboard configured"
    );

    // ── 2. Shared state & controller ─────────────────────────────────────
    let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config));
    let client = ApiClient::new(timeout)?;
    let controller = DashboardController::new(state.clone(), client)?;

    // ── 3. HTTP server ───────────────────────────────────────────────────
    let app = api::rest::router(ApiState::new(controller.clone()));
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "API server listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 4. Initial load + refresh loops ──────────────────────────────────
    let subscriptions = controller.start().await;
    info!(
        loops = ?subscriptions.names(),
        "All containers loaded. Press Ctrl+C to stop."
    );

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping refresh loops");
    subscriptions.stop_all().await;

    if let Err(e) = state.config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save dashboard config on shutdown");
    }

    info!("Kline Dashboard shut down complete.");
    Ok(())
}
