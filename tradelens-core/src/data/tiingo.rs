//! Tiingo data provider.
//!
//! Equities come from the daily prices endpoint using split/dividend-adjusted
//! OHLCV rounded to cents. Crypto comes from the crypto prices endpoint with a
//! daily resample; the pair is `{symbol}{quote}` in lowercase.

use super::provider::{
    check_status, date_window, http_client, normalize_bars, parse_date, send_error, BarProvider,
    DataError,
};
use crate::domain::{Bar, BarSeries};
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://api.tiingo.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiingoMarket {
    Equity,
    Crypto,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyPrice {
    date: String,
    adj_open: f64,
    adj_high: f64,
    adj_low: f64,
    adj_close: f64,
    adj_volume: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CryptoTicker {
    #[serde(default)]
    price_data: Vec<CryptoPrice>,
}

#[derive(Debug, Deserialize)]
struct CryptoPrice {
    date: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
}

fn round_cents(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Parse a daily prices response body into bars.
pub fn parse_daily(symbol: &str, body: &str) -> Result<Vec<Bar>, DataError> {
    let rows: Vec<DailyPrice> = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("tiingo daily {symbol}: {e}")))?;
    if rows.is_empty() {
        return Err(DataError::NoData {
            symbol: symbol.to_string(),
        });
    }
    rows.into_iter()
        .map(|r| {
            Ok(Bar::new(
                parse_date(&r.date)?,
                round_cents(r.adj_open),
                round_cents(r.adj_high),
                round_cents(r.adj_low),
                round_cents(r.adj_close),
                r.adj_volume.trunc(),
            ))
        })
        .collect()
}

/// Parse a crypto prices response body (first ticker's `priceData`).
pub fn parse_crypto(symbol: &str, body: &str) -> Result<Vec<Bar>, DataError> {
    let tickers: Vec<CryptoTicker> = serde_json::from_str(body)
        .map_err(|e| DataError::ResponseFormatChanged(format!("tiingo crypto {symbol}: {e}")))?;
    let prices = tickers
        .into_iter()
        .next()
        .map(|t| t.price_data)
        .unwrap_or_default();
    if prices.is_empty() {
        return Err(DataError::NoData {
            symbol: symbol.to_string(),
        });
    }
    prices
        .into_iter()
        .map(|p| {
            Ok(Bar::new(
                parse_date(&p.date)?,
                p.open,
                p.high,
                p.low,
                p.close,
                p.volume,
            ))
        })
        .collect()
}

pub struct TiingoProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    market: TiingoMarket,
    base_url: String,
}

impl TiingoProvider {
    pub fn new(api_key: impl Into<String>, market: TiingoMarket) -> Result<Self, DataError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(DataError::AuthenticationRequired(
                "Tiingo API key is empty".into(),
            ));
        }
        Ok(Self {
            client: http_client()?,
            api_key,
            market,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point at a different host (e.g. a local mock).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn daily_url(&self, symbol: &str, lookback_days: usize) -> String {
        let (start, end) = date_window(chrono::Utc::now().date_naive(), lookback_days);
        format!(
            "{}/tiingo/daily/{symbol}/prices?startDate={start}&endDate={end}",
            self.base_url
        )
    }

    fn crypto_url(&self, pair: &str, lookback_days: usize) -> String {
        let (start, end) = date_window(chrono::Utc::now().date_naive(), lookback_days);
        format!(
            "{}/tiingo/crypto/prices?tickers={pair}&startDate={start}&endDate={end}&resampleFreq=1day",
            self.base_url
        )
    }

    fn get(&self, url: &str, symbol: &str) -> Result<String, DataError> {
        let resp = self
            .client
            .get(url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Token {}", self.api_key))
            .send()
            .map_err(send_error)?;
        check_status("tiingo", symbol, resp.status())?;
        resp.text().map_err(send_error)
    }
}

impl BarProvider for TiingoProvider {
    fn name(&self) -> &str {
        match self.market {
            TiingoMarket::Equity => "tiingo",
            TiingoMarket::Crypto => "tiingo_crypto",
        }
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        lookback_days: usize,
        quote_currency: &str,
    ) -> Result<BarSeries, DataError> {
        let (label, bars) = match self.market {
            TiingoMarket::Equity => {
                let body = self.get(&self.daily_url(symbol, lookback_days), symbol)?;
                (symbol.to_uppercase(), parse_daily(symbol, &body)?)
            }
            TiingoMarket::Crypto => {
                let pair = format!("{}{}", symbol.to_lowercase(), quote_currency.to_lowercase());
                let body = self.get(&self.crypto_url(&pair, lookback_days), symbol)?;
                (pair.to_uppercase(), parse_crypto(symbol, &body)?)
            }
        };
        tracing::info!(
            provider = self.name(),
            symbol = %label,
            bars = bars.len(),
            "fetched bars"
        );
        normalize_bars(&label, bars)
    }
}
