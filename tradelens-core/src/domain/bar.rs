//! Bar: one daily trading session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar.
///
/// Prices are expected to be split/dividend adjusted by whoever produced the
/// bar. Volume is a float so fractional crypto volumes survive intact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Why a bar or a bar sequence was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar {date}: non-finite or negative value in {field}")]
    InvalidValue { date: NaiveDate, field: &'static str },

    #[error("bar {date}: OHLC out of order (low {low} / high {high} must bracket open and close)")]
    InconsistentRange { date: NaiveDate, low: f64, high: f64 },

    #[error("bar dates must be strictly increasing: {previous} followed by {next}")]
    NonIncreasingDates { previous: NaiveDate, next: NaiveDate },
}

impl Bar {
    pub fn new(date: NaiveDate, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            date,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// High minus low.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Check the OHLCV invariants: every value finite and non-negative,
    /// `low <= open, close <= high`.
    pub fn validate(&self) -> Result<(), BarError> {
        let fields = [
            ("open", self.open),
            ("high", self.high),
            ("low", self.low),
            ("close", self.close),
            ("volume", self.volume),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(BarError::InvalidValue {
                    date: self.date,
                    field,
                });
            }
        }

        let bracketed = self.low <= self.high
            && self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high;
        if !bracketed {
            return Err(BarError::InconsistentRange {
                date: self.date,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}
