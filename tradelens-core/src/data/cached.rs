//! Provider decorator that consults a [`BarCache`] before fetching.

use super::cache::{BarCache, CacheKey};
use super::provider::{BarProvider, DataError};
use crate::domain::BarSeries;
use std::sync::Arc;

pub struct CachedProvider<P> {
    inner: P,
    cache: Arc<BarCache>,
}

impl<P: BarProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: Arc<BarCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &BarCache {
        &self.cache
    }
}

impl<P: BarProvider> BarProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: usize,
        quote_currency: &str,
    ) -> Result<BarSeries, DataError> {
        let key = CacheKey::new(self.inner.name(), symbol, lookback_days, quote_currency);
        if let Some(series) = self.cache.get(&key) {
            tracing::info!(key = %key, "cache hit");
            return Ok(series);
        }
        tracing::info!(key = %key, "cache miss");
        let series = self.inner.fetch_bars(symbol, lookback_days, quote_currency)?;
        self.cache.insert(key, series.clone());
        Ok(series)
    }
}
