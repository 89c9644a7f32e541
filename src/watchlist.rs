// =============================================================================
// Watchlist — ordered, duplicate-free, session-scoped ticker list
// =============================================================================

use serde::Serialize;

/// Result of an add attempt. Failures leave the watchlist unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
    Invalid,
}

impl std::fmt::Display for AddOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::AlreadyPresent => write!(f, "already present"),
            Self::Invalid => write!(f, "invalid ticker"),
        }
    }
}

/// Ordered collection of tickers owned by one user session.
#[derive(Debug, Clone)]
pub struct Watchlist {
    tickers: Vec<String>,
}

impl Watchlist {
    /// Create a watchlist from seed tickers. Seeds are uppercased and
    /// deduplicated while preserving order.
    pub fn new(seeds: &[String]) -> Self {
        let mut tickers = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let upper = seed.trim().to_uppercase();
            if !upper.is_empty() && !tickers.contains(&upper) {
                tickers.push(upper);
            }
        }
        Self { tickers }
    }

    /// Append `ticker` if it is non-empty, present in `universe`, and not
    /// already a member. The input is uppercased before any check.
    pub fn add(&mut self, ticker: &str, universe: &[String]) -> AddOutcome {
        let ticker = ticker.trim().to_uppercase();
        if ticker.is_empty() || !universe.contains(&ticker) {
            return AddOutcome::Invalid;
        }
        if self.tickers.contains(&ticker) {
            return AddOutcome::AlreadyPresent;
        }
        self.tickers.push(ticker);
        AddOutcome::Added
    }

    /// Remove `ticker` if present; silently a no-op otherwise. Returns
    /// whether anything was removed.
    pub fn remove(&mut self, ticker: &str) -> bool {
        let ticker = ticker.trim().to_uppercase();
        let before = self.tickers.len();
        self.tickers.retain(|t| t != &ticker);
        self.tickers.len() < before
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Vec<String> {
        ["VNM", "FPT", "HPG", "VIC"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn seeds() -> Vec<String> {
        ["VNM", "FPT", "HPG"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_then_duplicate_then_remove_scenario() {
        let mut wl = Watchlist::new(&seeds());
        assert_eq!(wl.tickers(), &["VNM", "FPT", "HPG"]);

        assert_eq!(wl.add("VIC", &universe()), AddOutcome::Added);
        assert_eq!(wl.tickers(), &["VNM", "FPT", "HPG", "VIC"]);

        assert_eq!(wl.add("VIC", &universe()), AddOutcome::AlreadyPresent);
        assert_eq!(wl.tickers(), &["VNM", "FPT", "HPG", "VIC"]);

        wl.remove("FPT");
        assert_eq!(wl.tickers(), &["VNM", "HPG", "VIC"]);
    }

    #[test]
    fn add_rejects_unknown_and_empty_tickers() {
        let mut wl = Watchlist::new(&seeds());
        assert_eq!(wl.add("ZZZ", &universe()), AddOutcome::Invalid);
        assert_eq!(wl.add("", &universe()), AddOutcome::Invalid);
        assert_eq!(wl.add("   ", &universe()), AddOutcome::Invalid);
        assert_eq!(wl.len(), 3);
    }

    #[test]
    fn add_is_case_insensitive() {
        let mut wl = Watchlist::new(&seeds());
        assert_eq!(wl.add("vic", &universe()), AddOutcome::Added);
        assert_eq!(wl.tickers().last().unwrap(), "VIC");
        assert_eq!(wl.add("Vic", &universe()), AddOutcome::AlreadyPresent);
    }

    #[test]
    fn remove_absent_is_a_noop() {
        let mut wl = Watchlist::new(&seeds());
        assert!(!wl.remove("VIC"));
        assert_eq!(wl.len(), 3);
    }

    #[test]
    fn remove_present_decreases_length_by_one() {
        let mut wl = Watchlist::new(&seeds());
        assert!(wl.remove("fpt"));
        assert_eq!(wl.len(), 2);
        assert_eq!(wl.tickers(), &["VNM", "HPG"]);
    }

    #[test]
    fn seeds_are_deduplicated_and_uppercased() {
        let raw: Vec<String> = ["vnm", "VNM", " fpt "].iter().map(|s| s.to_string()).collect();
        let wl = Watchlist::new(&raw);
        assert_eq!(wl.tickers(), &["VNM", "FPT"]);
    }
}
