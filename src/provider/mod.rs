// =============================================================================
// Market Data Provider boundary
// =============================================================================
//
// The dashboard depends on exactly four provider operations. Everything
// upstream of this trait (wire protocol, payload quirks) is the client's
// problem; everything downstream receives well-typed records.
// =============================================================================

pub mod client;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::types::{HistoricalBar, MoverEntry, MoverDirection, Quote, TickerInfo};

pub use client::VnMarketClient;

/// The four market-data operations the dashboard consumes.
#[async_trait]
pub trait MarketDataApi: Send + Sync {
    /// All listed securities on the exchange.
    async fn list_tickers(&self) -> Result<Vec<TickerInfo>>;

    /// OHLCV series for `ticker` over `[start, end]` at the given interval
    /// (e.g. `"1D"`). Order and uniqueness are not guaranteed by the
    /// provider; callers normalise.
    async fn historical_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<HistoricalBar>>;

    /// Near-realtime quote for `ticker`. `None` when the provider has no row
    /// for the symbol.
    async fn quote(&self, ticker: &str) -> Result<Option<Quote>>;

    /// Market-wide top movers in `direction`, at most `count` entries.
    async fn top_movers(
        &self,
        direction: MoverDirection,
        count: usize,
    ) -> Result<Vec<MoverEntry>>;
}
