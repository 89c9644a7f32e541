// =============================================================================
// Cached Fetchers — the four provider calls behind TTL caches
// =============================================================================
//
// Each fetcher wraps exactly one provider operation with a time-bounded cache
// and error containment. Provider failures never propagate past this module:
// the error is recorded on the shared error log and the caller receives the
// empty/default value. The fallback value is cached for the same TTL as a
// success, so a flapping provider is hit at most once per window.
//
// Cache keys are the full argument tuple, so distinct tickers and day windows
// never collide.
// =============================================================================

use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};

use crate::app_state::ErrorLog;
use crate::cache::TtlCache;
use crate::config::DashboardConfig;
use crate::provider::MarketDataApi;
use crate::types::{HistoricalBar, MoverEntry, MoverDirection, Quote, TickerInfo, TopMovers};

/// Daily bars are the only resolution the dashboard charts.
const DAILY_INTERVAL: &str = "1D";

/// Upper bound on the historical lookback window (ten years). Requests come
/// straight from a query parameter; anything outside `[1, MAX_HISTORY_DAYS]`
/// is clamped so date arithmetic stays in range.
const MAX_HISTORY_DAYS: i64 = 3650;

/// The four cached fetchers plus the manual cache-clear control.
pub struct MarketDataService {
    api: Arc<dyn MarketDataApi>,
    errors: Arc<ErrorLog>,

    listing_ttl: Duration,
    historical_ttl: Duration,
    quote_ttl: Duration,
    movers_ttl: Duration,
    top_mover_count: usize,

    listing_cache: TtlCache<(), Vec<TickerInfo>>,
    historical_cache: TtlCache<(String, i64), Vec<HistoricalBar>>,
    quote_cache: TtlCache<String, Option<Quote>>,
    movers_cache: TtlCache<(), TopMovers>,
}

impl MarketDataService {
    pub fn new(
        api: Arc<dyn MarketDataApi>,
        errors: Arc<ErrorLog>,
        config: &DashboardConfig,
    ) -> Self {
        Self {
            api,
            errors,
            listing_ttl: Duration::from_secs(config.listing_ttl_secs),
            historical_ttl: Duration::from_secs(config.historical_ttl_secs),
            quote_ttl: Duration::from_secs(config.quote_ttl_secs),
            movers_ttl: Duration::from_secs(config.movers_ttl_secs),
            top_mover_count: config.top_mover_count,
            listing_cache: TtlCache::new(),
            historical_cache: TtlCache::new(),
            quote_cache: TtlCache::new(),
            movers_cache: TtlCache::new(),
        }
    }

    // -------------------------------------------------------------------------
    // ListTickers
    // -------------------------------------------------------------------------

    /// The full ticker universe. Empty on provider failure.
    pub async fn list_tickers(&self) -> Vec<TickerInfo> {
        if let Some(cached) = self.listing_cache.get(&()) {
            debug!(count = cached.len(), "listing served from cache");
            return cached;
        }

        let tickers = match self.api.list_tickers().await {
            Ok(tickers) => tickers,
            Err(e) => {
                warn!(error = %e, "listing fetch failed");
                self.errors.push(format!("failed to fetch ticker listing: {e}"));
                Vec::new()
            }
        };

        self.listing_cache.insert((), tickers.clone(), self.listing_ttl);
        tickers
    }

    /// Just the ticker symbols of the universe, for validation and selectors.
    pub async fn ticker_symbols(&self) -> Vec<String> {
        self.list_tickers()
            .await
            .into_iter()
            .map(|info| info.ticker)
            .collect()
    }

    // -------------------------------------------------------------------------
    // FetchHistorical
    // -------------------------------------------------------------------------

    /// Daily bars for `ticker` over the last `days` days (clamped to
    /// `[1, MAX_HISTORY_DAYS]`), ascending by date with one bar per date,
    /// restricted to `[today - days, today]`. Empty on provider failure or
    /// when the provider has no rows.
    pub async fn historical(&self, ticker: &str, days: i64) -> Vec<HistoricalBar> {
        let ticker = ticker.to_uppercase();
        let days = days.clamp(1, MAX_HISTORY_DAYS);
        let key = (ticker.clone(), days);

        if let Some(cached) = self.historical_cache.get(&key) {
            debug!(ticker = %key.0, days, count = cached.len(), "history served from cache");
            return cached;
        }

        let end = Utc::now().date_naive();
        let start = end - chrono::Duration::days(days);

        let bars = match self
            .api
            .historical_series(&ticker, start, end, DAILY_INTERVAL)
            .await
        {
            Ok(bars) if bars.is_empty() => {
                warn!(ticker = %ticker, "no historical data returned");
                self.errors.push(format!("no historical data for {ticker}"));
                Vec::new()
            }
            Ok(mut bars) => {
                // Normalise: clamp to the requested window, ascending order,
                // one bar per date (later provider rows win).
                bars.retain(|b| b.date >= start && b.date <= end);
                bars.sort_by_key(|b| b.date);
                bars.reverse();
                bars.dedup_by_key(|b| b.date);
                bars.reverse();
                bars
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "historical fetch failed");
                self.errors
                    .push(format!("failed to fetch history for {ticker}: {e}"));
                Vec::new()
            }
        };

        self.historical_cache.insert(key, bars.clone(), self.historical_ttl);
        bars
    }

    // -------------------------------------------------------------------------
    // FetchQuote
    // -------------------------------------------------------------------------

    /// Near-realtime quote for `ticker`. `None` when the provider fails or
    /// has no row for the symbol.
    pub async fn quote(&self, ticker: &str) -> Option<Quote> {
        let ticker = ticker.to_uppercase();

        if let Some(cached) = self.quote_cache.get(&ticker) {
            debug!(ticker = %ticker, "quote served from cache");
            return cached;
        }

        let quote = match self.api.quote(&ticker).await {
            Ok(quote) => quote,
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "quote fetch failed");
                self.errors
                    .push(format!("failed to fetch quote for {ticker}: {e}"));
                None
            }
        };

        self.quote_cache.insert(ticker, quote.clone(), self.quote_ttl);
        quote
    }

    // -------------------------------------------------------------------------
    // FetchTopMovers
    // -------------------------------------------------------------------------

    /// Top gainers and losers, each ranked and truncated to the configured
    /// count. Both lists empty when either provider call fails.
    pub async fn top_movers(&self) -> TopMovers {
        if let Some(cached) = self.movers_cache.get(&()) {
            debug!("top movers served from cache");
            return cached;
        }

        let fetched = async {
            let gainers = self
                .api
                .top_movers(MoverDirection::Gainers, self.top_mover_count)
                .await?;
            let losers = self
                .api
                .top_movers(MoverDirection::Losers, self.top_mover_count)
                .await?;
            anyhow::Ok((gainers, losers))
        }
        .await;

        let movers = match fetched {
            Ok((gainers, losers)) => TopMovers {
                gainers: rank_movers(gainers, MoverDirection::Gainers, self.top_mover_count),
                losers: rank_movers(losers, MoverDirection::Losers, self.top_mover_count),
            },
            Err(e) => {
                warn!(error = %e, "top movers fetch failed");
                self.errors.push(format!("failed to fetch top movers: {e}"));
                TopMovers::default()
            }
        };

        self.movers_cache.insert((), movers.clone(), self.movers_ttl);
        movers
    }

    // -------------------------------------------------------------------------
    // Manual cache invalidation
    // -------------------------------------------------------------------------

    /// Drop every cache entry immediately; the next call of each fetcher
    /// re-fetches regardless of remaining TTL.
    pub fn clear_cache(&self) {
        self.listing_cache.clear();
        self.historical_cache.clear();
        self.quote_cache.clear();
        self.movers_cache.clear();
        debug!("all fetcher caches cleared");
    }
}

/// Sort movers for `direction` (gainers: change descending, losers: change
/// ascending), break ties by ticker lexical ascending, truncate to `count`,
/// and assign 1-based ranks. The tie-break makes the ranking stable across
/// fetches regardless of provider row order.
fn rank_movers(
    mut entries: Vec<MoverEntry>,
    direction: MoverDirection,
    count: usize,
) -> Vec<MoverEntry> {
    entries.sort_by(|a, b| {
        let by_change = match direction {
            MoverDirection::Gainers => b
                .price_change_pct
                .partial_cmp(&a.price_change_pct)
                .unwrap_or(Ordering::Equal),
            MoverDirection::Losers => a
                .price_change_pct
                .partial_cmp(&b.price_change_pct)
                .unwrap_or(Ordering::Equal),
        };
        by_change.then_with(|| a.ticker.cmp(&b.ticker))
    });
    entries.truncate(count);
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.rank = (i + 1) as u32;
    }
    entries
}
