// =============================================================================
// Dashboard Configuration — JSON file with serde defaults and env overrides
// =============================================================================
//
// Every field carries `#[serde(default)]` so that adding new fields never
// breaks loading an older config file. There is no save path: nothing in the
// dashboard mutates configuration at runtime, and no state survives a
// restart.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_bind_addr() -> String {
    "0.0.0.0:3001".to_string()
}

fn default_provider_base_url() -> String {
    "https://api.vnmarket.example".to_string()
}

fn default_ticker() -> String {
    "VNM".to_string()
}

fn default_watchlist() -> Vec<String> {
    vec!["VNM".to_string(), "FPT".to_string(), "HPG".to_string()]
}

fn default_listing_ttl_secs() -> u64 {
    3600
}

fn default_historical_ttl_secs() -> u64 {
    60
}

fn default_quote_ttl_secs() -> u64 {
    30
}

fn default_movers_ttl_secs() -> u64 {
    60
}

fn default_history_days() -> i64 {
    365
}

fn default_top_mover_count() -> usize {
    5
}

fn default_session_idle_secs() -> u64 {
    86_400
}

// =============================================================================
// DashboardConfig
// =============================================================================

/// Top-level configuration for the dashboard service.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Base URL of the market-data provider REST API.
    #[serde(default = "default_provider_base_url")]
    pub provider_base_url: String,

    /// Ticker selected when the client asks for the dashboard without one.
    /// Falls back to the first listed ticker when absent from the universe.
    #[serde(default = "default_ticker")]
    pub default_ticker: String,

    /// Seed watchlist for every new session.
    #[serde(default = "default_watchlist")]
    pub default_watchlist: Vec<String>,

    // --- Fetcher cache TTLs (seconds) ----------------------------------------
    /// Ticker universe listing.
    #[serde(default = "default_listing_ttl_secs")]
    pub listing_ttl_secs: u64,

    /// Historical OHLCV series.
    #[serde(default = "default_historical_ttl_secs")]
    pub historical_ttl_secs: u64,

    /// Near-realtime quote.
    #[serde(default = "default_quote_ttl_secs")]
    pub quote_ttl_secs: u64,

    /// Top gainers/losers rankings.
    #[serde(default = "default_movers_ttl_secs")]
    pub movers_ttl_secs: u64,

    // --- Data windows ---------------------------------------------------------
    /// Default lookback for the candlestick chart, in days.
    #[serde(default = "default_history_days")]
    pub history_days: i64,

    /// Number of entries in each top-movers table.
    #[serde(default = "default_top_mover_count")]
    pub top_mover_count: usize,

    /// Sessions idle for longer than this are pruned.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            provider_base_url: default_provider_base_url(),
            default_ticker: default_ticker(),
            default_watchlist: default_watchlist(),
            listing_ttl_secs: default_listing_ttl_secs(),
            historical_ttl_secs: default_historical_ttl_secs(),
            quote_ttl_secs: default_quote_ttl_secs(),
            movers_ttl_secs: default_movers_ttl_secs(),
            history_days: default_history_days(),
            top_mover_count: default_top_mover_count(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            provider = %config.provider_base_url,
            default_ticker = %config.default_ticker,
            "config loaded"
        );

        Ok(config)
    }

    /// Apply environment-variable overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("VNDASH_BIND_ADDR") {
            if !addr.is_empty() {
                self.bind_addr = addr;
            }
        }
        if let Ok(url) = std::env::var("VNDASH_PROVIDER_URL") {
            if !url.is_empty() {
                self.provider_base_url = url;
            }
        }
        if let Ok(list) = std::env::var("VNDASH_WATCHLIST") {
            let seeds: Vec<String> = list
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !seeds.is_empty() {
                self.default_watchlist = seeds;
            }
        }
    }
}
