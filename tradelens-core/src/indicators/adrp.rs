//! Average Daily Range Percentage (ADRP).
//!
//! Mean over the window of (high - low) / close * 100.
//! A zero close makes its window undefined.
//! Lookback: period - 1.

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Adrp {
    period: usize,
    name: String,
}

impl Adrp {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADRP period must be >= 1");
        Self {
            period,
            name: format!("adrp_{period}"),
        }
    }
}

impl Indicator for Adrp {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let daily: Vec<f64> = bars
            .iter()
            .map(|b| {
                if b.close > 0.0 {
                    b.range() / b.close * 100.0
                } else {
                    f64::NAN
                }
            })
            .collect();
        rolling_mean(&daily, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn adrp_of_constant_range() {
        // make_bars with flat closes: high = close + 1, low = close - 1 → range 2
        let bars = make_bars(&[100.0; 5]);
        let result = Adrp::new(3).compute(&bars);
        assert!(result[1].is_nan());
        assert_approx(result[2], 2.0, DEFAULT_EPSILON);
        assert_approx(result[4], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn adrp_averages_percentages_not_ranges() {
        let mut bars = make_bars(&[100.0, 50.0]);
        bars[0].high = 101.0;
        bars[0].low = 99.0; // 2%
        bars[1].high = 52.0;
        bars[1].low = 48.0; // 8%
        let result = Adrp::new(2).compute(&bars);
        assert_approx(result[1], 5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn adrp_zero_close_is_undefined() {
        let mut bars = make_bars(&[1.0, 1.0, 1.0]);
        bars[1].close = 0.0;
        bars[1].low = 0.0;
        let result = Adrp::new(2).compute(&bars);
        assert!(result[1].is_nan());
        assert!(result[2].is_nan());
    }
}
