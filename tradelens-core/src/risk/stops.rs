//! Stop-loss suggestions.
//!
//! Candidates come from four sources: ATR multiples, fixed percentages, the
//! nearest swing pivot on the protective side, and moving averages on the
//! protective side. Everything is returned, closest to price first.

use super::position_size::Direction;
use crate::config::RiskConfig;
use crate::error::{AnalysisError, Result};
use crate::patterns::{Pivot, PivotKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    Atr,
    Percent,
    SwingLow,
    SwingHigh,
    MovingAverage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSuggestion {
    pub kind: StopKind,
    /// Short description, e.g. "2x ATR", "5%", "SMA 50".
    pub label: String,
    pub price: f64,
    /// Absolute distance from the reference price.
    pub distance: f64,
    pub distance_percent: f64,
}

impl StopSuggestion {
    fn new(kind: StopKind, label: String, reference: f64, price: f64) -> Self {
        let distance = (reference - price).abs();
        Self {
            kind,
            label,
            price,
            distance,
            distance_percent: distance / reference * 100.0,
        }
    }
}

/// Collect stop candidates around `price` for a trade in `direction`.
///
/// `pivots` are raw swing pivots (any order); `moving_averages` are
/// `(period, value)` pairs. ATR stops are skipped when `atr` is `None`, and
/// long-side levels that would fall to zero or below are dropped.
pub fn suggest_stops(
    price: f64,
    direction: Direction,
    atr: Option<f64>,
    pivots: &[Pivot],
    moving_averages: &[(usize, f64)],
    config: &RiskConfig,
) -> Result<Vec<StopSuggestion>> {
    config.validate()?;
    if !(price.is_finite() && price > 0.0) {
        return Err(AnalysisError::invalid(
            "price",
            format!("{price} must be positive"),
        ));
    }
    let protective = |level: f64| match direction {
        Direction::Long => level < price && level > 0.0,
        Direction::Short => level > price,
    };
    let away = -direction.sign();
    let mut out = Vec::new();

    if let Some(atr) = atr.filter(|a| a.is_finite() && *a > 0.0) {
        for &m in &config.atr_multiples {
            let level = price + away * m * atr;
            if protective(level) {
                out.push(StopSuggestion::new(StopKind::Atr, format!("{m}x ATR"), price, level));
            }
        }
    }

    for &pct in &config.percent_stops {
        let level = price * (1.0 + away * pct);
        if protective(level) {
            out.push(StopSuggestion::new(
                StopKind::Percent,
                format!("{}%", (pct * 100.0 * 1e4).round() / 1e4),
                price,
                level,
            ));
        }
    }

    let (wanted, kind) = match direction {
        Direction::Long => (PivotKind::Low, StopKind::SwingLow),
        Direction::Short => (PivotKind::High, StopKind::SwingHigh),
    };
    // Nearest in price; ties go to the most recent pivot.
    let swing = pivots
        .iter()
        .filter(|p| p.kind == wanted && protective(p.price))
        .min_by(|a, b| {
            (price - a.price)
                .abs()
                .total_cmp(&(price - b.price).abs())
                .then(b.index.cmp(&a.index))
        });
    if let Some(pivot) = swing {
        let label = match kind {
            StopKind::SwingLow => format!("swing low {}", pivot.date),
            _ => format!("swing high {}", pivot.date),
        };
        out.push(StopSuggestion::new(kind, label, price, pivot.price));
    }

    for &(period, value) in moving_averages {
        if protective(value) {
            out.push(StopSuggestion::new(
                StopKind::MovingAverage,
                format!("SMA {period}"),
                price,
                value,
            ));
        }
    }

    out.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    Ok(out)
}
