// =============================================================================
// Central Application State — VN Market Dashboard
// =============================================================================
//
// Single source of truth for the service. Handlers hold an `Arc<AppState>`;
// the cached fetchers and the session table live here. Thread safety:
//   - Atomic counter for lock-free version tracking.
//   - parking_lot::RwLock for the mutable shared collections.
// =============================================================================

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::config::DashboardConfig;
use crate::fetchers::MarketDataService;
use crate::provider::MarketDataApi;
use crate::watchlist::{AddOutcome, Watchlist};

// =============================================================================
// Error Log
// =============================================================================

/// Maximum number of recent errors to retain.
const MAX_RECENT_ERRORS: usize = 50;

/// A recorded, contained error for inline display on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    /// Human-readable error message.
    pub message: String,
    /// ISO 8601 timestamp.
    pub at: String,
}

/// Capped ring of recent contained errors, shared between the fetchers and
/// the API surface.
pub struct ErrorLog {
    records: RwLock<Vec<ErrorRecord>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Record an error message, evicting the oldest entry beyond the cap.
    pub fn push(&self, message: String) {
        let mut records = self.records.write();
        records.push(ErrorRecord {
            message,
            at: Utc::now().to_rfc3339(),
        });
        while records.len() > MAX_RECENT_ERRORS {
            records.remove(0);
        }
    }

    pub fn recent(&self) -> Vec<ErrorRecord> {
        self.records.read().clone()
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Sessions
// =============================================================================

/// Per-session state: the watchlist plus an activity timestamp for pruning.
struct Session {
    watchlist: Watchlist,
    last_seen: Instant,
}

// =============================================================================
// AppState
// =============================================================================

/// Central application state shared across handlers via `Arc<AppState>`.
pub struct AppState {
    /// Monotonically increasing version counter, incremented on every
    /// meaningful state mutation. The dashboard polls it to detect changes.
    pub state_version: AtomicU64,

    /// Immutable after startup; nothing reconfigures the dashboard at
    /// runtime.
    pub config: DashboardConfig,

    /// The four cached fetchers.
    pub service: MarketDataService,

    /// Recent contained errors.
    pub errors: Arc<ErrorLog>,

    /// Session table. Sessions are created on demand and pruned after the
    /// configured idle horizon; none survive a process restart.
    sessions: RwLock<HashMap<Uuid, Session>>,

    /// Instant when the service started. Used for uptime.
    pub start_time: Instant,
}

impl AppState {
    /// Construct the shared state from config and a provider client. The
    /// returned value is typically wrapped in `Arc` immediately.
    pub fn new(config: DashboardConfig, api: Arc<dyn MarketDataApi>) -> Self {
        let errors = Arc::new(ErrorLog::new());
        let service = MarketDataService::new(api, errors.clone(), &config);

        Self {
            state_version: AtomicU64::new(1),
            config,
            service,
            errors,
            sessions: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    // ── Version Management ──────────────────────────────────────────────

    /// Atomically increment the state version. Call after every meaningful
    /// mutation.
    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst)
    }

    /// Read the current state version without modifying it.
    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    // ── Sessions & Watchlists ───────────────────────────────────────────

    /// Resolve `id` to a live session, creating one (seeded with the default
    /// watchlist) when the id is absent or unknown. Refreshes the session's
    /// activity timestamp and opportunistically prunes idle sessions.
    pub fn ensure_session(&self, id: Option<Uuid>) -> Uuid {
        let idle_horizon = Duration::from_secs(self.config.session_idle_secs);
        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| s.last_seen.elapsed() <= idle_horizon);

        if let Some(id) = id {
            if let Some(session) = sessions.get_mut(&id) {
                session.last_seen = Instant::now();
                return id;
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(
            id,
            Session {
                watchlist: Watchlist::new(&self.config.default_watchlist),
                last_seen: Instant::now(),
            },
        );
        self.increment_version();
        id
    }

    /// Current watchlist tickers for a live session.
    pub fn watchlist_tickers(&self, id: Uuid) -> Vec<String> {
        self.sessions
            .read()
            .get(&id)
            .map(|s| s.watchlist.tickers().to_vec())
            .unwrap_or_default()
    }

    /// Add `ticker` to the session's watchlist, validated against `universe`.
    pub fn add_to_watchlist(&self, id: Uuid, ticker: &str, universe: &[String]) -> AddOutcome {
        let outcome = {
            let mut sessions = self.sessions.write();
            match sessions.get_mut(&id) {
                Some(session) => session.watchlist.add(ticker, universe),
                None => AddOutcome::Invalid,
            }
        };
        if outcome == AddOutcome::Added {
            self.increment_version();
        }
        outcome
    }

    /// Remove `ticker` from the session's watchlist; no-op when absent.
    pub fn remove_from_watchlist(&self, id: Uuid, ticker: &str) {
        let removed = {
            let mut sessions = self.sessions.write();
            match sessions.get_mut(&id) {
                Some(session) => session.watchlist.remove(ticker),
                None => false,
            }
        };
        if removed {
            self.increment_version();
        }
    }

    /// Number of live sessions (for the health endpoint).
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}
