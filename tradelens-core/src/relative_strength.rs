//! Relative Strength Engine: symbol vs benchmark over several horizons.
//!
//! Returns are computed on the date inner-join of the two series, so a horizon
//! of `h` needs `h + 1` shared dates. Horizons without enough history are
//! omitted and the composite weights renormalize over the rest.

use crate::config::RelativeStrengthConfig;
use crate::domain::{align_closes, AlignedClose, BarSeries};
use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Outperforming,
    Underperforming,
    Inline,
}

impl Classification {
    fn from_difference(difference: f64, band: f64) -> Self {
        if difference > band {
            Self::Outperforming
        } else if difference < -band {
            Self::Underperforming
        } else {
            Self::Inline
        }
    }
}

/// Bucketed reading of an RS score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthLabel {
    StrongOutperformance,
    ModerateOutperformance,
    SlightOutperformance,
    SlightUnderperformance,
    ModerateUnderperformance,
    StrongUnderperformance,
}

impl StrengthLabel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Self::StrongOutperformance,
            s if s >= 65.0 => Self::ModerateOutperformance,
            s if s >= 50.0 => Self::SlightOutperformance,
            s if s >= 35.0 => Self::SlightUnderperformance,
            s if s >= 20.0 => Self::ModerateUnderperformance,
            _ => Self::StrongUnderperformance,
        }
    }
}

/// RS score in [1, 99]: 50 plus the excess return in percentage points.
pub fn rs_score(difference: f64) -> f64 {
    (50.0 + difference * 100.0).clamp(1.0, 99.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorizonResult {
    /// Trading days.
    pub horizon: usize,
    /// Fractional return, 0.05 = +5%.
    pub symbol_return: f64,
    pub benchmark_return: f64,
    /// `symbol_return - benchmark_return`.
    pub difference: f64,
    pub classification: Classification,
    pub rs_score: f64,
    pub label: StrengthLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelativeStrengthResult {
    pub symbol: String,
    pub benchmark: String,
    pub as_of: NaiveDate,
    pub aligned_bars: usize,
    /// Available horizons, in configured order.
    pub horizons: Vec<HorizonResult>,
    /// Horizons skipped for lack of shared history.
    pub omitted_horizons: Vec<usize>,
    /// Weighted mean difference over available horizons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_label: Option<StrengthLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub composite_classification: Option<Classification>,
}

/// Compare `symbol` against `benchmark`. `benchmark_label` only names the
/// benchmark in the output.
///
/// Fails with `InsufficientData` when the series share no dates.
pub fn compute_relative_strength(
    symbol: &BarSeries,
    benchmark: &BarSeries,
    benchmark_label: &str,
    config: &RelativeStrengthConfig,
) -> Result<RelativeStrengthResult> {
    config.validate()?;

    let aligned = align_closes(symbol, benchmark);
    let last = aligned.last().ok_or_else(|| {
        AnalysisError::insufficient(format!(
            "{} and {benchmark_label} share no trading dates",
            symbol.symbol()
        ))
    })?;

    let mut horizons = Vec::new();
    let mut omitted = Vec::new();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for (&horizon, &weight) in config.horizons.iter().zip(&config.weights) {
        match horizon_result(&aligned, horizon, config.inline_band) {
            Some(result) => {
                weighted_sum += weight * result.difference;
                weight_total += weight;
                horizons.push(result);
            }
            None => omitted.push(horizon),
        }
    }

    if !omitted.is_empty() {
        tracing::warn!(
            symbol = %symbol.symbol(),
            benchmark = %benchmark_label,
            aligned = aligned.len(),
            omitted = ?omitted,
            "relative strength horizons omitted"
        );
    }

    let composite = (weight_total > 0.0).then(|| weighted_sum / weight_total);

    Ok(RelativeStrengthResult {
        symbol: symbol.symbol().to_string(),
        benchmark: benchmark_label.to_string(),
        as_of: last.date,
        aligned_bars: aligned.len(),
        horizons,
        omitted_horizons: omitted,
        composite,
        composite_score: composite.map(rs_score),
        composite_label: composite.map(|c| StrengthLabel::from_score(rs_score(c))),
        composite_classification: composite
            .map(|c| Classification::from_difference(c, config.inline_band)),
    })
}

fn horizon_result(aligned: &[AlignedClose], horizon: usize, band: f64) -> Option<HorizonResult> {
    let n = aligned.len();
    if n < horizon + 1 {
        return None;
    }
    let (base, now) = (&aligned[n - 1 - horizon], &aligned[n - 1]);
    if base.symbol <= 0.0 || base.benchmark <= 0.0 {
        return None;
    }

    let symbol_return = now.symbol / base.symbol - 1.0;
    let benchmark_return = now.benchmark / base.benchmark - 1.0;
    let difference = symbol_return - benchmark_return;
    let score = rs_score(difference);

    Some(HorizonResult {
        horizon,
        symbol_return,
        benchmark_return,
        difference,
        classification: Classification::from_difference(difference, band),
        rs_score: score,
        label: StrengthLabel::from_score(score),
    })
}
