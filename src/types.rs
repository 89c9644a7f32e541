// =============================================================================
// Shared market-data types used across the dashboard
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One listed security from the exchange listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerInfo {
    pub ticker: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub exchange: String,
}

/// Snapshot quote for a single ticker at fetch time. Ephemeral; re-fetched
/// per TTL window, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub ticker: String,
    pub price_current: f64,
    pub reference_price: f64,
    pub high_price: f64,
    pub total_volume: f64,
    pub price_change: f64,
    pub price_change_pct: f64,
}

/// One daily OHLCV bar of a ticker's historical series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Entry in a market-wide top-movers ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoverEntry {
    pub ticker: String,
    pub price_change: f64,
    pub price_change_pct: f64,
    /// 1-based rank within its list, assigned after sorting.
    #[serde(default)]
    pub rank: u32,
}

/// The two top-5 mover tables shown on the market overview panel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopMovers {
    pub gainers: Vec<MoverEntry>,
    pub losers: Vec<MoverEntry>,
}

/// Ranking direction requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoverDirection {
    Gainers,
    Losers,
}

impl std::fmt::Display for MoverDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gainers => write!(f, "gainers"),
            Self::Losers => write!(f, "losers"),
        }
    }
}
