// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All JSON endpoints live under `/api/v1/`; `/` serves the embedded
// single-page dashboard. No endpoint requires authentication. Watchlist
// endpoints are session-scoped via the `x-session-id` header; a missing or
// unknown id transparently creates a fresh session whose id is echoed in the
// response body.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::chart::candlestick_chart;
use crate::watchlist::AddOutcome;

/// Embedded single-page dashboard.
const DASHBOARD_HTML: &str = include_str!("../../assets/dashboard.html");

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Presentation ────────────────────────────────────────────
        .route("/", get(index))
        // ── Status ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        .route("/api/v1/errors", get(recent_errors))
        // ── Market data ─────────────────────────────────────────────
        .route("/api/v1/tickers", get(tickers))
        .route("/api/v1/quote/:ticker", get(quote))
        .route("/api/v1/history/:ticker", get(history))
        .route("/api/v1/chart/:ticker", get(chart))
        .route("/api/v1/movers", get(movers))
        .route("/api/v1/dashboard", get(dashboard))
        // ── Sessions & watchlist ────────────────────────────────────
        .route("/api/v1/session", post(create_session))
        .route("/api/v1/watchlist", get(get_watchlist).post(add_to_watchlist))
        .route("/api/v1/watchlist/:ticker", delete(remove_from_watchlist))
        // ── Controls ────────────────────────────────────────────────
        .route("/api/v1/cache/clear", post(clear_cache))
        // ── Middleware & State ──────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

/// Parse the optional `x-session-id` header into a session id.
fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
}

// =============================================================================
// Presentation
// =============================================================================

async fn index() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

// =============================================================================
// Status
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_secs: u64,
    sessions: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        sessions: state.session_count(),
    };
    Json(resp)
}

async fn recent_errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.errors.recent())
}

// =============================================================================
// Market data
// =============================================================================

async fn tickers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.list_tickers().await)
}

async fn quote(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> impl IntoResponse {
    let quote = state.service.quote(&ticker).await;
    Json(serde_json::json!({
        "ticker": ticker.to_uppercase(),
        "quote": quote,
    }))
}

#[derive(Deserialize)]
struct HistoryParams {
    days: Option<i64>,
}

async fn history(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let days = params.days.unwrap_or(state.config.history_days);
    let bars = state.service.historical(&ticker, days).await;
    Json(bars)
}

async fn chart(
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let days = params.days.unwrap_or(state.config.history_days);
    let bars = state.service.historical(&ticker, days).await;
    Json(candlestick_chart(&bars, &ticker))
}

async fn movers(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.top_movers().await)
}

// =============================================================================
// Combined dashboard snapshot
// =============================================================================

#[derive(Deserialize)]
struct DashboardParams {
    ticker: Option<String>,
    days: Option<i64>,
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> impl IntoResponse {
    let universe = state.service.ticker_symbols().await;
    let selected = resolve_ticker(params.ticker.as_deref(), &universe, &state.config.default_ticker);
    let days = params.days.unwrap_or(state.config.history_days);

    // Each panel degrades independently: a failed quote still leaves the
    // chart and the movers tables populated.
    let quote = state.service.quote(&selected).await;
    let bars = state.service.historical(&selected, days).await;
    let chart = candlestick_chart(&bars, &selected);
    let movers = state.service.top_movers().await;

    Json(serde_json::json!({
        "state_version": state.current_state_version(),
        "server_time": chrono::Utc::now().timestamp_millis(),
        "selected_ticker": selected,
        "quote": quote,
        "chart": chart,
        "movers": movers,
        "recent_errors": state.errors.recent(),
    }))
}

/// Pick the ticker to display: the explicit request wins; otherwise the
/// configured default when listed, else the first universe entry, else the
/// configured default verbatim (its fetches will degrade to empty panels).
fn resolve_ticker(requested: Option<&str>, universe: &[String], default: &str) -> String {
    if let Some(t) = requested {
        let t = t.trim().to_uppercase();
        if !t.is_empty() {
            return t;
        }
    }
    let default = default.to_uppercase();
    if universe.contains(&default) {
        return default;
    }
    universe.first().cloned().unwrap_or(default)
}

// =============================================================================
// Sessions & watchlist
// =============================================================================

#[derive(Serialize)]
struct WatchlistResponse {
    session_id: Uuid,
    watchlist: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<AddOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

async fn create_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let id = state.ensure_session(None);
    info!(session_id = %id, "session created");
    Json(WatchlistResponse {
        session_id: id,
        watchlist: state.watchlist_tickers(id),
        outcome: None,
        message: None,
    })
}

async fn get_watchlist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let id = state.ensure_session(session_id_from_headers(&headers));
    Json(WatchlistResponse {
        session_id: id,
        watchlist: state.watchlist_tickers(id),
        outcome: None,
        message: None,
    })
}

#[derive(Deserialize)]
struct AddTickerRequest {
    ticker: String,
}

async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<AddTickerRequest>,
) -> impl IntoResponse {
    let id = state.ensure_session(session_id_from_headers(&headers));
    let universe = state.service.ticker_symbols().await;
    let outcome = state.add_to_watchlist(id, &req.ticker, &universe);

    let status = match outcome {
        AddOutcome::Added => StatusCode::OK,
        AddOutcome::AlreadyPresent => StatusCode::CONFLICT,
        AddOutcome::Invalid => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let message = match outcome {
        AddOutcome::Added => format!("added {} to watchlist", req.ticker.to_uppercase()),
        AddOutcome::AlreadyPresent => {
            format!("{} is already in the watchlist", req.ticker.to_uppercase())
        }
        AddOutcome::Invalid => format!("ticker '{}' is not listed", req.ticker),
    };

    info!(session_id = %id, ticker = %req.ticker, outcome = %outcome, "watchlist add");

    (
        status,
        Json(WatchlistResponse {
            session_id: id,
            watchlist: state.watchlist_tickers(id),
            outcome: Some(outcome),
            message: Some(message),
        }),
    )
}

async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(ticker): Path<String>,
) -> impl IntoResponse {
    let id = state.ensure_session(session_id_from_headers(&headers));
    state.remove_from_watchlist(id, &ticker);

    info!(session_id = %id, ticker = %ticker, "watchlist remove");

    Json(WatchlistResponse {
        session_id: id,
        watchlist: state.watchlist_tickers(id),
        outcome: None,
        message: None,
    })
}

// =============================================================================
// Controls
// =============================================================================

async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.service.clear_cache();
    state.increment_version();
    info!("fetcher caches cleared via API");

    Json(serde_json::json!({
        "status": "ok",
        "message": "all fetcher caches cleared",
    }))
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::DashboardConfig;
    use crate::provider::MarketDataApi;
    use crate::types::{HistoricalBar, MoverEntry, MoverDirection, Quote, TickerInfo};

    /// Fixed-universe provider stub for router tests.
    struct StubApi {
        universe: Vec<&'static str>,
    }

    #[async_trait]
    impl MarketDataApi for StubApi {
        async fn list_tickers(&self) -> Result<Vec<TickerInfo>> {
            Ok(self
                .universe
                .iter()
                .map(|t| TickerInfo {
                    ticker: t.to_string(),
                    company_name: String::new(),
                    exchange: "HOSE".to_string(),
                })
                .collect())
        }

        async fn historical_series(
            &self,
            _ticker: &str,
            start: NaiveDate,
            _end: NaiveDate,
            _interval: &str,
        ) -> Result<Vec<HistoricalBar>> {
            Ok((1..=3)
                .map(|i| HistoricalBar {
                    date: start + chrono::Duration::days(i),
                    open: 60.0,
                    high: 62.0,
                    low: 59.0,
                    close: 60.0 + i as f64,
                    volume: 1000.0,
                })
                .collect())
        }

        async fn quote(&self, ticker: &str) -> Result<Option<Quote>> {
            Ok(Some(Quote {
                ticker: ticker.to_uppercase(),
                price_current: 67.5,
                reference_price: 66.0,
                high_price: 68.0,
                total_volume: 1_000_000.0,
                price_change: 1.5,
                price_change_pct: 2.27,
            }))
        }

        async fn top_movers(
            &self,
            _direction: MoverDirection,
            _count: usize,
        ) -> Result<Vec<MoverEntry>> {
            Ok(vec![MoverEntry {
                ticker: "VIC".to_string(),
                price_change: 3.0,
                price_change_pct: 6.5,
                rank: 0,
            }])
        }
    }

    fn test_router(universe: Vec<&'static str>) -> Router {
        let state = Arc::new(AppState::new(
            DashboardConfig::default(),
            Arc::new(StubApi { universe }),
        ));
        router(state)
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = test_router(vec!["VNM", "FPT", "HPG", "VIC"]);
        let resp = app
            .oneshot(Request::builder().uri("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn index_serves_dashboard_page() {
        let app = test_router(vec!["VNM"]);
        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert!(std::str::from_utf8(&bytes).unwrap().contains("<html"));
    }

    #[tokio::test]
    async fn chart_endpoint_returns_candlestick_spec() {
        let app = test_router(vec!["VNM"]);
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/chart/vnm?days=30")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"][0]["type"], "candlestick");
        assert_eq!(json["data"][0]["x"].as_array().unwrap().len(), 3);
        assert_eq!(json["layout"]["template"], "plotly_dark");
    }

    #[tokio::test]
    async fn dashboard_defaults_to_vnm_when_listed() {
        let app = test_router(vec!["AAA", "VNM", "FPT"]);
        let resp = app
            .oneshot(Request::builder().uri("/api/v1/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["selected_ticker"], "VNM");
        assert_eq!(json["quote"]["ticker"], "VNM");
        assert_eq!(json["movers"]["gainers"][0]["ticker"], "VIC");
    }

    #[tokio::test]
    async fn dashboard_falls_back_to_first_listed_ticker() {
        let app = test_router(vec!["AAA", "BBB"]);
        let resp = app
            .oneshot(Request::builder().uri("/api/v1/dashboard").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["selected_ticker"], "AAA");
    }

    #[tokio::test]
    async fn watchlist_flow_add_duplicate_remove() {
        let app = test_router(vec!["VNM", "FPT", "HPG", "VIC"]);

        // Create a session.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/session")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        let session_id = json["session_id"].as_str().unwrap().to_string();
        assert_eq!(
            json["watchlist"],
            serde_json::json!(["VNM", "FPT", "HPG"])
        );

        // Add VIC.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/watchlist")
                    .header("x-session-id", &session_id)
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"ticker":"VIC"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(
            json["watchlist"],
            serde_json::json!(["VNM", "FPT", "HPG", "VIC"])
        );

        // Add VIC again: conflict, unchanged.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/watchlist")
                    .header("x-session-id", &session_id)
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"ticker":"VIC"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let json = body_json(resp).await;
        assert_eq!(json["outcome"], "already_present");
        assert_eq!(
            json["watchlist"],
            serde_json::json!(["VNM", "FPT", "HPG", "VIC"])
        );

        // Unknown ticker: unprocessable, unchanged.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/watchlist")
                    .header("x-session-id", &session_id)
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"ticker":"ZZZ"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        // Remove FPT.
        let resp = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri("/api/v1/watchlist/FPT")
                    .header("x-session-id", &session_id)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(
            json["watchlist"],
            serde_json::json!(["VNM", "HPG", "VIC"])
        );
    }

    #[tokio::test]
    async fn unknown_session_id_gets_a_fresh_session() {
        let app = test_router(vec!["VNM", "FPT", "HPG"]);
        let bogus = Uuid::new_v4().to_string();
        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/watchlist")
                    .header("x-session-id", &bogus)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        // A new session was issued with the default seed.
        assert_ne!(json["session_id"].as_str().unwrap(), bogus);
        assert_eq!(json["watchlist"], serde_json::json!(["VNM", "FPT", "HPG"]));
    }

    #[tokio::test]
    async fn cache_clear_returns_ok() {
        let app = test_router(vec!["VNM"]);
        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/cache/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
    }
}
