//! Binance public klines provider (no API key).

use super::provider::{
    check_status, http_client, normalize_bars, send_error, BarProvider, DataError,
};
use crate::domain::{Bar, BarSeries};
use chrono::DateTime;
use serde_json::Value;

const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Largest `limit` the klines endpoint accepts.
pub const MAX_KLINES: usize = 1000;

/// Trading pair for `symbol` against `quote`, e.g. `btc` + `usdt` -> `BTCUSDT`.
/// A symbol that already carries the quote suffix is left alone.
pub fn pair_for(symbol: &str, quote: &str) -> String {
    let symbol = symbol.to_uppercase();
    let quote = quote.to_uppercase();
    if quote.is_empty() || (symbol.ends_with(&quote) && symbol.len() > quote.len()) {
        symbol
    } else {
        format!("{symbol}{quote}")
    }
}

fn number(row: &[Value], i: usize, what: &str) -> Result<f64, DataError> {
    let parsed = match row.get(i) {
        Some(Value::String(s)) => s.parse::<f64>().ok(),
        Some(Value::Number(n)) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| DataError::ResponseFormatChanged(format!("kline {what} at column {i}")))
}

/// Parse a klines body: arrays of `[open_time_ms, "open", "high", "low",
/// "close", "volume", ...]`.
pub fn parse_klines(pair: &str, body: &str) -> Result<Vec<Bar>, DataError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("binance {pair}: {e}")))?;
    if rows.is_empty() {
        return Err(DataError::NoData {
            symbol: pair.to_string(),
        });
    }
    rows.iter()
        .map(|row| {
            let millis = row
                .first()
                .and_then(Value::as_i64)
                .ok_or_else(|| DataError::ResponseFormatChanged("kline open time".into()))?;
            let date = DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("timestamp {millis}")))?
                .date_naive();
            Ok(Bar::new(
                date,
                number(row, 1, "open")?,
                number(row, 2, "high")?,
                number(row, 3, "low")?,
                number(row, 4, "close")?,
                number(row, 5, "volume")?,
            ))
        })
        .collect()
}

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BinanceProvider {
    pub fn new() -> Result<Self, DataError> {
        Ok(Self {
            client: http_client()?,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl BarProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: usize,
        quote_currency: &str,
    ) -> Result<BarSeries, DataError> {
        let pair = pair_for(symbol, quote_currency);
        let limit = lookback_days.clamp(1, MAX_KLINES);
        let url = format!(
            "{}/api/v3/klines?symbol={pair}&interval=1d&limit={limit}",
            self.base_url
        );
        let resp = self.client.get(&url).send().map_err(send_error)?;
        // Unknown pairs come back as 400 with an error body.
        if resp.status() == reqwest::StatusCode::BAD_REQUEST {
            return Err(DataError::SymbolNotFound { symbol: pair });
        }
        check_status("binance", &pair, resp.status())?;
        let body = resp.text().map_err(send_error)?;
        let bars = parse_klines(&pair, &body)?;
        tracing::info!(provider = "binance", symbol = %pair, bars = bars.len(), "fetched bars");
        normalize_bars(&pair, bars)
    }
}
