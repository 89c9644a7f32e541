// =============================================================================
// VN Market Dashboard — Main Entry Point
// =============================================================================
//
// A single-process web dashboard for Vietnamese stock market data: quote
// metrics, candlestick chart, and market-wide top movers, served over a
// cached market-data provider client. Strictly request-driven: every fetch
// happens inside the HTTP handler that needs it.
// =============================================================================

mod api;
mod app_state;
mod cache;
mod chart;
mod config;
mod fetchers;
mod provider;
mod types;
mod watchlist;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::config::DashboardConfig;
use crate::provider::VnMarketClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = DashboardConfig::load("vndash.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        DashboardConfig::default()
    });
    config.apply_env_overrides();

    info!(
        provider = %config.provider_base_url,
        default_ticker = %config.default_ticker,
        watchlist = ?config.default_watchlist,
        "VN Market Dashboard starting"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let client = Arc::new(VnMarketClient::new(config.provider_base_url.clone()));
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, client));

    // ── 3. Serve ─────────────────────────────────────────────────────────
    let app = api::rest::router(state);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "dashboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received — stopping");
        })
        .await?;

    info!("VN Market Dashboard shut down complete.");
    Ok(())
}
