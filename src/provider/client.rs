// =============================================================================
// Vietnamese Market Data REST Client
// =============================================================================
//
// All endpoints are public and unsigned. Responses wrap rows in a top-level
// `data` array; numeric fields arrive as either JSON numbers or strings
// depending on the upstream gateway, so every extraction goes through the
// lenient `parse_f64` helper.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::provider::MarketDataApi;
use crate::types::{HistoricalBar, MoverEntry, MoverDirection, Quote, TickerInfo};

/// HTTP client for the market-data provider REST API.
#[derive(Clone)]
pub struct VnMarketClient {
    base_url: String,
    client: reqwest::Client,
}

impl VnMarketClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a new client against `base_url` (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        debug!(base_url = %base_url, "VnMarketClient initialised");

        Self { base_url, client }
    }

    // -------------------------------------------------------------------------
    // Request helper
    // -------------------------------------------------------------------------

    /// GET `path` and return the `data` array from the response envelope.
    async fn get_data_rows(&self, path: &str) -> Result<Vec<serde_json::Value>> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {path} request failed"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse {path} response"))?;

        if !status.is_success() {
            anyhow::bail!("provider GET {} returned {}: {}", path, status, body);
        }

        let rows = body["data"]
            .as_array()
            .cloned()
            .with_context(|| format!("{path} response missing 'data' array"))?;

        Ok(rows)
    }

    // -------------------------------------------------------------------------
    // Row parsers
    // -------------------------------------------------------------------------

    fn parse_listing_row(row: &serde_json::Value) -> Option<TickerInfo> {
        let ticker = row["ticker"].as_str()?.to_uppercase();
        Some(TickerInfo {
            ticker,
            company_name: row["organName"].as_str().unwrap_or("").to_string(),
            exchange: row["comGroupCode"].as_str().unwrap_or("").to_string(),
        })
    }

    fn parse_bar_row(row: &serde_json::Value) -> Result<HistoricalBar> {
        let raw_date = row["tradingDate"]
            .as_str()
            .context("bar row missing 'tradingDate'")?;
        // Some gateways append a time component ("2024-01-02T00:00:00").
        // `get` keeps a garbage multi-byte date on the error path instead of
        // panicking on a non-boundary byte slice.
        let date_part = raw_date.get(..10).unwrap_or(raw_date);
        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .with_context(|| format!("failed to parse trading date '{raw_date}'"))?;

        Ok(HistoricalBar {
            date,
            open: Self::parse_f64(&row["open"])?,
            high: Self::parse_f64(&row["high"])?,
            low: Self::parse_f64(&row["low"])?,
            close: Self::parse_f64(&row["close"])?,
            volume: Self::parse_f64(&row["volume"])?,
        })
    }

    fn parse_quote_row(row: &serde_json::Value, ticker: &str) -> Result<Quote> {
        Ok(Quote {
            ticker: ticker.to_uppercase(),
            price_current: Self::parse_f64(&row["priceCurrent"])?,
            reference_price: Self::parse_f64(&row["referencePrice"])?,
            high_price: Self::parse_f64(&row["highPrice"])?,
            total_volume: Self::parse_f64(&row["totalVolume"])?,
            price_change: Self::parse_f64(&row["priceChange"])?,
            price_change_pct: Self::parse_f64(&row["priceChangeRatio"])?,
        })
    }

    fn parse_mover_row(row: &serde_json::Value) -> Option<MoverEntry> {
        let ticker = row["ticker"].as_str()?.to_uppercase();
        let price_change = Self::parse_f64(&row["priceChange"]).ok()?;
        let price_change_pct = Self::parse_f64(&row["priceChangeRatio"]).ok()?;
        Some(MoverEntry {
            ticker,
            price_change,
            price_change_pct,
            rank: 0,
        })
    }

    /// Parse a JSON value that may be either a string or a number into `f64`.
    fn parse_f64(val: &serde_json::Value) -> Result<f64> {
        if let Some(s) = val.as_str() {
            s.parse::<f64>()
                .with_context(|| format!("failed to parse '{s}' as f64"))
        } else if let Some(n) = val.as_f64() {
            Ok(n)
        } else {
            anyhow::bail!("expected string or number, got: {val}")
        }
    }
}

#[async_trait]
impl MarketDataApi for VnMarketClient {
    /// GET /api/v1/listing
    #[instrument(skip(self), name = "provider::list_tickers")]
    async fn list_tickers(&self) -> Result<Vec<TickerInfo>> {
        let rows = self.get_data_rows("/api/v1/listing").await?;

        let mut tickers = Vec::with_capacity(rows.len());
        for row in &rows {
            match Self::parse_listing_row(row) {
                Some(info) => tickers.push(info),
                None => warn!("skipping listing row without a ticker field"),
            }
        }

        debug!(count = tickers.len(), "listing fetched");
        Ok(tickers)
    }

    /// GET /api/v1/history?ticker=&resolution=&from=&to=
    #[instrument(skip(self), name = "provider::historical_series")]
    async fn historical_series(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
        interval: &str,
    ) -> Result<Vec<HistoricalBar>> {
        let path = format!(
            "/api/v1/history?ticker={}&resolution={}&from={}&to={}",
            ticker.to_uppercase(),
            interval,
            start.format("%Y-%m-%d"),
            end.format("%Y-%m-%d"),
        );
        let rows = self.get_data_rows(&path).await?;

        let mut bars = Vec::with_capacity(rows.len());
        for row in &rows {
            match Self::parse_bar_row(row) {
                Ok(bar) => bars.push(bar),
                Err(e) => warn!(ticker, error = %e, "skipping malformed bar row"),
            }
        }

        debug!(ticker, count = bars.len(), "historical series fetched");
        Ok(bars)
    }

    /// GET /api/v1/quote?ticker=
    #[instrument(skip(self), name = "provider::quote")]
    async fn quote(&self, ticker: &str) -> Result<Option<Quote>> {
        let path = format!("/api/v1/quote?ticker={}", ticker.to_uppercase());
        let rows = self.get_data_rows(&path).await?;

        let quote = match rows.first() {
            Some(row) => Some(Self::parse_quote_row(row, ticker)?),
            None => None,
        };

        debug!(ticker, found = quote.is_some(), "quote fetched");
        Ok(quote)
    }

    /// GET /api/v1/top-movers?direction=&count=
    #[instrument(skip(self), name = "provider::top_movers")]
    async fn top_movers(
        &self,
        direction: MoverDirection,
        count: usize,
    ) -> Result<Vec<MoverEntry>> {
        let path = format!("/api/v1/top-movers?direction={direction}&count={count}");
        let rows = self.get_data_rows(&path).await?;

        let mut movers = Vec::with_capacity(rows.len());
        for row in &rows {
            match Self::parse_mover_row(row) {
                Some(entry) => movers.push(entry),
                None => warn!(%direction, "skipping malformed mover row"),
            }
        }

        debug!(%direction, count = movers.len(), "top movers fetched");
        Ok(movers)
    }
}

impl std::fmt::Debug for VnMarketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VnMarketClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}
