//! BarSeries: a validated, date-ordered sequence of bars for one symbol.

use super::bar::{Bar, BarError};
use serde::Serialize;

/// Ordered daily bars for a single symbol.
///
/// Construction enforces the bar invariants and strictly increasing dates, so
/// every engine can index the series without re-checking. An empty series is
/// representable; the engines reject it with `InsufficientData`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, BarError> {
        for bar in &bars {
            bar.validate()?;
        }
        for pair in bars.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(BarError::NonIncreasingDates {
                    previous: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Close of the most recent bar.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    /// The most recent `n` bars (all of them when `n >= len`), plus the index
    /// of the first returned bar within the full series.
    pub fn tail(&self, n: usize) -> (usize, &[Bar]) {
        let start = self.bars.len().saturating_sub(n);
        (start, &self.bars[start..])
    }

    pub fn into_bars(self) -> Vec<Bar> {
        self.bars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> Bar {
        Bar::new(
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            close,
            close + 1.0,
            close - 1.0,
            close,
            1000.0,
        )
    }

    #[test]
    fn accepts_increasing_dates() {
        let series = BarSeries::new("SPY", vec![bar(2, 100.0), bar(3, 101.0)]).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.symbol(), "SPY");
        assert_eq!(series.last_close(), Some(101.0));
    }

    #[test]
    fn rejects_duplicate_dates() {
        let err = BarSeries::new("SPY", vec![bar(2, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, BarError::NonIncreasingDates { .. }));
    }

    #[test]
    fn rejects_descending_dates() {
        let err = BarSeries::new("SPY", vec![bar(3, 100.0), bar(2, 101.0)]).unwrap_err();
        assert!(matches!(err, BarError::NonIncreasingDates { .. }));
    }

    #[test]
    fn rejects_invalid_bar() {
        let mut bad = bar(2, 100.0);
        bad.low = 200.0;
        assert!(BarSeries::new("SPY", vec![bad]).is_err());
    }

    #[test]
    fn empty_series_is_allowed() {
        let series = BarSeries::new("SPY", vec![]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.last_close(), None);
    }

    #[test]
    fn tail_clamps_to_length() {
        let series =
            BarSeries::new("SPY", vec![bar(2, 100.0), bar(3, 101.0), bar(4, 102.0)]).unwrap();
        let (start, tail) = series.tail(2);
        assert_eq!(start, 1);
        assert_eq!(tail.len(), 2);
        let (start, tail) = series.tail(10);
        assert_eq!(start, 0);
        assert_eq!(tail.len(), 3);
    }
}
