//! Indicator Snapshot: latest value of every configured indicator.
//!
//! Indicators the series is too short for are omitted (absent map entry or
//! `None`), never zero-filled. Only a zero-bar series is an error.

use super::macd::macd_series;
use super::{last_defined, previous_defined, Adrp, Atr, Indicator, Rsi, Sma, VolumeSma};
use crate::config::IndicatorConfig;
use crate::domain::BarSeries;
use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Price/moving-average trend classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    /// Price above the average and the average rising.
    Uptrend,
    /// Price below the average and the average falling.
    Downtrend,
    Neutral,
}

impl TrendDirection {
    fn classify(price: f64, value: f64, previous: Option<f64>) -> Self {
        match previous {
            Some(prev) if price > value && value > prev => Self::Uptrend,
            Some(prev) if price < value && value < prev => Self::Downtrend,
            _ => Self::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAverageReading {
    pub period: usize,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<f64>,
    pub price_above: bool,
    pub trend: TrendDirection,
}

/// Sign flip of (MACD - signal) between the last two bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacdCross {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdReading {
    pub macd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub histogram: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crossover: Option<MacdCross>,
}

/// Whether a faster SMA sits above the next slower one (e.g. 20 over 50).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmaAlignment {
    pub fast: usize,
    pub slow: usize,
    pub bullish: bool,
}

/// Boolean trend checklist derived from the readings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendStatus {
    /// Price above each computed SMA, keyed by period.
    pub above_sma: BTreeMap<usize, bool>,
    /// Adjacent-period SMA ordering, only where both SMAs are defined.
    pub sma_alignment: Vec<SmaAlignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd_bullish: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub date: NaiveDate,
    pub price: f64,
    pub sma: BTreeMap<usize, MovingAverageReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rsi: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub macd: Option<MacdReading>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adrp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_sma: Option<f64>,
    pub trend: TrendStatus,
}

impl IndicatorSnapshot {
    /// Compute every configured indicator and keep the latest values.
    pub fn compute(series: &BarSeries, config: &IndicatorConfig) -> Result<Self> {
        config.validate()?;
        let last = series.last().ok_or_else(|| {
            AnalysisError::insufficient(format!("{}: series has zero bars", series.symbol()))
        })?;
        let bars = series.bars();
        let price = last.close;

        let mut periods = config.sma_periods.clone();
        periods.sort_unstable();
        periods.dedup();

        let mut sma = BTreeMap::new();
        for &period in &periods {
            let values = Sma::new(period).compute(bars);
            if let Some(value) = last_defined(&values) {
                let previous = previous_defined(&values);
                sma.insert(
                    period,
                    MovingAverageReading {
                        period,
                        value,
                        previous,
                        price_above: price > value,
                        trend: TrendDirection::classify(price, value, previous),
                    },
                );
            }
        }

        let rsi = last_defined(&Rsi::new(config.rsi_period).compute(bars));
        let macd = macd_reading(series, config);
        let atr = last_defined(&Atr::new(config.atr_period).compute(bars));
        let adrp = last_defined(&Adrp::new(config.adrp_period).compute(bars));
        let volume_sma = last_defined(&VolumeSma::new(config.volume_sma_period).compute(bars));

        let trend = trend_status(&periods, &sma, macd.as_ref());

        let snapshot = Self {
            symbol: series.symbol().to_string(),
            date: last.date,
            price,
            sma,
            rsi,
            macd,
            atr,
            adrp,
            volume_sma,
            trend,
        };

        tracing::debug!(
            symbol = %snapshot.symbol,
            bars = series.len(),
            indicators = snapshot.values().len(),
            "indicator snapshot computed"
        );
        Ok(snapshot)
    }

    /// Flat name → value view of every defined indicator
    /// (e.g. `sma_20`, `rsi`, `macd_signal`).
    pub fn values(&self) -> BTreeMap<String, f64> {
        let mut out = BTreeMap::new();
        for (period, reading) in &self.sma {
            out.insert(format!("sma_{period}"), reading.value);
        }
        let scalars = [
            ("rsi", self.rsi),
            ("atr", self.atr),
            ("adrp", self.adrp),
            ("volume_sma", self.volume_sma),
            ("macd", self.macd.as_ref().map(|m| m.macd)),
            ("macd_signal", self.macd.as_ref().and_then(|m| m.signal)),
            ("macd_histogram", self.macd.as_ref().and_then(|m| m.histogram)),
        ];
        for (name, value) in scalars {
            if let Some(v) = value {
                out.insert(name.to_string(), v);
            }
        }
        out
    }
}

fn macd_reading(series: &BarSeries, config: &IndicatorConfig) -> Option<MacdReading> {
    let lines = macd_series(
        series.bars(),
        config.macd_fast,
        config.macd_slow,
        config.macd_signal,
    );
    let macd = last_defined(&lines.macd)?;
    let signal = last_defined(&lines.signal);
    let histogram = last_defined(&lines.histogram);

    let crossover = match (previous_defined(&lines.histogram), histogram) {
        (Some(prev), Some(curr)) if prev <= 0.0 && curr > 0.0 => Some(MacdCross::Bullish),
        (Some(prev), Some(curr)) if prev >= 0.0 && curr < 0.0 => Some(MacdCross::Bearish),
        _ => None,
    };

    Some(MacdReading {
        macd,
        signal,
        histogram,
        crossover,
    })
}

fn trend_status(
    periods: &[usize],
    sma: &BTreeMap<usize, MovingAverageReading>,
    macd: Option<&MacdReading>,
) -> TrendStatus {
    let above_sma = sma
        .iter()
        .map(|(period, reading)| (*period, reading.price_above))
        .collect();

    let sma_alignment = periods
        .windows(2)
        .filter_map(|pair| {
            let fast = sma.get(&pair[0])?;
            let slow = sma.get(&pair[1])?;
            Some(SmaAlignment {
                fast: pair[0],
                slow: pair[1],
                bullish: fast.value > slow.value,
            })
        })
        .collect();

    let macd_bullish = macd.and_then(|m| m.signal.map(|s| m.macd > s));

    TrendStatus {
        above_sma,
        sma_alignment,
        macd_bullish,
    }
}
