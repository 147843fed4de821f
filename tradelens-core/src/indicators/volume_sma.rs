//! Volume moving average.
//!
//! Mean of volume over the window. Lookback: period - 1.

use super::sma::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct VolumeSma {
    period: usize,
    name: String,
}

impl VolumeSma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "volume SMA period must be >= 1");
        Self {
            period,
            name: format!("volume_sma_{period}"),
        }
    }
}

impl Indicator for VolumeSma {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        rolling_mean(&volumes, self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn volume_sma_basic() {
        let mut bars = make_bars(&[10.0, 10.0, 10.0, 10.0]);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.volume = (i as f64 + 1.0) * 100.0;
        }
        let result = VolumeSma::new(2).compute(&bars);
        assert!(result[0].is_nan());
        assert_approx(result[1], 150.0, DEFAULT_EPSILON);
        assert_approx(result[3], 350.0, DEFAULT_EPSILON);
    }
}
