//! Bar provider trait and structured error types.
//!
//! `BarProvider` abstracts over market-data sources (Tiingo equities, Tiingo
//! crypto, Binance) so the CLI can pick one at runtime and tests can mock it.
//! Providers return a normalized [`BarSeries`]: sorted, de-duplicated and
//! validated.

use crate::domain::{Bar, BarError, BarSeries};
use chrono::{Duration, NaiveDate};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("{provider} returned HTTP {status} for {symbol}")]
    HttpStatus {
        provider: &'static str,
        symbol: String,
        status: u16,
    },

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("no data returned for {symbol}")]
    NoData { symbol: String },

    #[error("invalid bars: {0}")]
    InvalidBars(#[from] BarError),
}

/// Source of daily OHLCV bars.
pub trait BarProvider: Send + Sync {
    /// Short provider identifier, also part of cache keys.
    fn name(&self) -> &str;

    /// Fetch roughly the last `lookback_days` calendar days of daily bars.
    ///
    /// `quote_currency` only matters for crypto pairs; equity providers
    /// ignore it.
    fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: usize,
        quote_currency: &str,
    ) -> Result<BarSeries, DataError>;
}

/// Sort ascending by date, drop repeated dates (first occurrence wins) and
/// validate into a [`BarSeries`].
pub fn normalize_bars(symbol: &str, mut bars: Vec<Bar>) -> Result<BarSeries, DataError> {
    bars.sort_by_key(|b| b.date);
    let before = bars.len();
    bars.dedup_by_key(|b| b.date);
    if bars.len() != before {
        tracing::debug!(
            symbol,
            dropped = before - bars.len(),
            "dropped duplicate dates"
        );
    }
    Ok(BarSeries::new(symbol, bars)?)
}

/// `[end - lookback_days, end]` as request parameters.
pub(crate) fn date_window(end: NaiveDate, lookback_days: usize) -> (NaiveDate, NaiveDate) {
    (end - Duration::days(lookback_days as i64), end)
}

pub(crate) fn http_client() -> Result<reqwest::blocking::Client, DataError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .user_agent(concat!("tradelens/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DataError::NetworkUnreachable(format!("build HTTP client: {e}")))
}

/// Map non-success statuses to errors.
pub(crate) fn check_status(
    provider: &'static str,
    symbol: &str,
    status: reqwest::StatusCode,
) -> Result<(), DataError> {
    if status.is_success() {
        return Ok(());
    }
    Err(match status {
        reqwest::StatusCode::NOT_FOUND => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            DataError::AuthenticationRequired(format!("{provider} rejected the credentials"))
        }
        other => DataError::HttpStatus {
            provider,
            symbol: symbol.to_string(),
            status: other.as_u16(),
        },
    })
}

pub(crate) fn send_error(e: reqwest::Error) -> DataError {
    DataError::NetworkUnreachable(e.to_string())
}

/// Parse the date part of `2024-01-02` or `2024-01-02T00:00:00.000Z`.
pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, DataError> {
    raw.get(..10)
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .ok_or_else(|| DataError::ResponseFormatChanged(format!("bad date: {raw}")))
}
