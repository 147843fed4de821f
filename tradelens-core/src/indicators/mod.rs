//! Indicator Engine.
//!
//! Every indicator implements [`Indicator`]: full bar history in, a series of
//! the same length out, `f64::NAN` during warmup. [`IndicatorSnapshot`] reads
//! the latest defined value of each configured indicator and omits the ones
//! the series is too short for.

pub mod adrp;
pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod volume_sma;

pub use adrp::Adrp;
pub use atr::Atr;
pub use ema::Ema;
pub use macd::{Macd, MacdLine, MacdSeries};
pub use rsi::Rsi;
pub use sma::Sma;
pub use snapshot::{
    IndicatorSnapshot, MacdCross, MacdReading, MovingAverageReading, SmaAlignment, TrendDirection,
    TrendStatus,
};
pub use volume_sma::VolumeSma;

use crate::domain::Bar;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No value at bar t may depend on bars after t. The truncated-vs-full series
/// test in `tests/lookahead_test.rs` covers every implementation.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars with no valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    ///
    /// Returns a `Vec<f64>` of the same length as `bars`; the first
    /// `lookback()` values are `f64::NAN`.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Value at the last index, `None` when empty or still in warmup.
pub fn last_defined(series: &[f64]) -> Option<f64> {
    series.last().copied().filter(|v| !v.is_nan())
}

/// Value at the second-to-last index, `None` when undefined.
pub fn previous_defined(series: &[f64]) -> Option<f64> {
    series
        .len()
        .checked_sub(2)
        .and_then(|i| series.get(i).copied())
        .filter(|v| !v.is_nan())
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = (open.min(close) - 1.0).max(0.0);
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
