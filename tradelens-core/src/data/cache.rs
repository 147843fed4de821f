//! In-memory TTL cache for fetched bar series.
//!
//! Entries are keyed by provider, symbol, lookback and quote currency and
//! expire after a fixed time-to-live (five minutes by default). When the cache
//! is full, expired entries are purged first, then the oldest entry is evicted.

use crate::domain::BarSeries;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_MAX_ENTRIES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub provider: String,
    pub symbol: String,
    pub lookback_days: usize,
    pub quote_currency: String,
}

impl CacheKey {
    /// Symbols are case-insensitive (stored upper), quotes stored lower.
    pub fn new(provider: &str, symbol: &str, lookback_days: usize, quote_currency: &str) -> Self {
        Self {
            provider: provider.to_string(),
            symbol: symbol.to_uppercase(),
            lookback_days,
            quote_currency: quote_currency.to_lowercase(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.provider, self.symbol, self.lookback_days, self.quote_currency
        )
    }
}

struct Entry {
    series: BarSeries,
    inserted: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheEntryStatus {
    pub key: String,
    pub age_seconds: f64,
    pub expired: bool,
    pub bars: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub ttl_seconds: u64,
    pub max_entries: usize,
    pub total_entries: usize,
    pub entries: Vec<CacheEntryStatus>,
}

pub struct BarCache {
    ttl: Duration,
    max_entries: usize,
    entries: Mutex<HashMap<CacheKey, Entry>>,
}

impl Default for BarCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_MAX_ENTRIES)
    }
}

impl BarCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries: max_entries.max(1),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Entry>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn get(&self, key: &CacheKey) -> Option<BarSeries> {
        self.get_at(key, Instant::now())
    }

    /// Fresh entry for `key` as seen at `now`. Expired entries are removed.
    pub fn get_at(&self, key: &CacheKey, now: Instant) -> Option<BarSeries> {
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(e) if now.saturating_duration_since(e.inserted) < self.ttl => {
                return Some(e.series.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.remove(key);
        }
        None
    }

    pub fn insert(&self, key: CacheKey, series: BarSeries) {
        self.insert_at(key, series, Instant::now());
    }

    pub fn insert_at(&self, key: CacheKey, series: BarSeries, now: Instant) {
        let mut entries = self.lock();
        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            let ttl = self.ttl;
            entries.retain(|_, e| now.saturating_duration_since(e.inserted) < ttl);
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.inserted)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    tracing::debug!(key = %oldest, "evicting oldest cache entry");
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key,
            Entry {
                series,
                inserted: now,
            },
        );
    }

    /// Drop everything; returns how many entries were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.lock();
        let n = entries.len();
        entries.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> CacheStatus {
        self.status_at(Instant::now())
    }

    pub fn status_at(&self, now: Instant) -> CacheStatus {
        let entries = self.lock();
        let mut rows: Vec<CacheEntryStatus> = entries
            .iter()
            .map(|(k, e)| {
                let age = now.saturating_duration_since(e.inserted);
                CacheEntryStatus {
                    key: k.to_string(),
                    age_seconds: age.as_secs_f64(),
                    expired: age >= self.ttl,
                    bars: e.series.len(),
                }
            })
            .collect();
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        CacheStatus {
            ttl_seconds: self.ttl.as_secs(),
            max_entries: self.max_entries,
            total_entries: rows.len(),
            entries: rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn series(symbol: &str, n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n).map(|i| 10.0 + i as f64).collect();
        BarSeries::new(symbol, make_bars(&closes)).unwrap()
    }

    #[test]
    fn key_normalizes_case() {
        let a = CacheKey::new("tiingo", "aapl", 30, "USD");
        let b = CacheKey::new("tiingo", "AAPL", 30, "usd");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "tiingo:AAPL:30:usd");
    }

    #[test]
    fn hit_before_ttl_miss_after() {
        let cache = BarCache::new(Duration::from_secs(300), 8);
        let key = CacheKey::new("tiingo", "AAPL", 30, "usd");
        let t0 = Instant::now();
        cache.insert_at(key.clone(), series("AAPL", 5), t0);

        let hit = cache.get_at(&key, t0 + Duration::from_secs(299)).unwrap();
        assert_eq!(hit.len(), 5);
        assert!(cache.get_at(&key, t0 + Duration::from_secs(300)).is_none());
        // Expired entry was dropped on read.
        assert!(cache.is_empty());
    }

    #[test]
    fn different_lookback_is_different_key() {
        let cache = BarCache::default();
        cache.insert(CacheKey::new("tiingo", "AAPL", 30, "usd"), series("AAPL", 3));
        assert!(cache.get(&CacheKey::new("tiingo", "AAPL", 60, "usd")).is_none());
        assert!(cache.get(&CacheKey::new("binance", "AAPL", 30, "usd")).is_none());
    }

    #[test]
    fn full_cache_purges_expired_then_evicts_oldest() {
        let cache = BarCache::new(Duration::from_secs(100), 2);
        let t0 = Instant::now();
        let a = CacheKey::new("p", "A", 1, "usd");
        let b = CacheKey::new("p", "B", 1, "usd");
        let c = CacheKey::new("p", "C", 1, "usd");
        let d = CacheKey::new("p", "D", 1, "usd");

        cache.insert_at(a.clone(), series("A", 2), t0);
        cache.insert_at(b.clone(), series("B", 2), t0 + Duration::from_secs(50));
        // A has expired by t0+120, so it goes and B survives.
        cache.insert_at(c.clone(), series("C", 2), t0 + Duration::from_secs(120));
        assert_eq!(cache.len(), 2);
        let now = t0 + Duration::from_secs(121);
        assert!(cache.get_at(&a, now).is_none());
        assert!(cache.get_at(&b, now).is_some());

        // Nothing expired at t0+130: oldest (B) is evicted.
        cache.insert_at(d.clone(), series("D", 2), t0 + Duration::from_secs(130));
        let now = t0 + Duration::from_secs(131);
        assert!(cache.get_at(&b, now).is_none());
        assert!(cache.get_at(&c, now).is_some());
        assert!(cache.get_at(&d, now).is_some());
    }

    #[test]
    fn status_reports_age_and_expiry() {
        let cache = BarCache::new(Duration::from_secs(300), 8);
        let t0 = Instant::now();
        cache.insert_at(CacheKey::new("tiingo", "AAPL", 30, "usd"), series("AAPL", 4), t0);
        cache.insert_at(
            CacheKey::new("tiingo", "MSFT", 30, "usd"),
            series("MSFT", 6),
            t0 + Duration::from_secs(200),
        );

        let status = cache.status_at(t0 + Duration::from_secs(310));
        assert_eq!(status.ttl_seconds, 300);
        assert_eq!(status.total_entries, 2);
        assert_eq!(status.entries[0].key, "tiingo:AAPL:30:usd");
        assert!(status.entries[0].expired);
        assert_eq!(status.entries[0].bars, 4);
        assert!(!status.entries[1].expired);
        assert!((status.entries[1].age_seconds - 110.0).abs() < 1e-9);
    }

    #[test]
    fn clear_returns_count() {
        let cache = BarCache::default();
        cache.insert(CacheKey::new("p", "A", 1, "usd"), series("A", 2));
        cache.insert(CacheKey::new("p", "B", 1, "usd"), series("B", 2));
        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
    }
}
