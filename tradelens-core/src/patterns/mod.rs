//! Pattern Engine.
//!
//! Two steps: extract swing pivots over the lookback window, then scan the
//! alternating pivot sequence for double tops/bottoms, head-and-shoulders
//! (regular and inverse) and contracting triangles. Overlapping detections are
//! all reported.
//!
//! Confidence is `0.5 * tightness + 0.5 * maturity`, where tightness measures
//! how far inside its tolerances the geometry sits and maturity rewards more
//! supporting pivots and a confirming close beyond the pattern's trigger level.

pub mod matchers;
pub mod pivots;

pub use pivots::{alternate, find_pivots, Pivot, PivotKind};

use crate::config::PatternConfig;
use crate::domain::BarSeries;
use crate::error::{AnalysisError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    DoubleTop,
    DoubleBottom,
    HeadAndShoulders,
    InverseHeadAndShoulders,
    AscendingTriangle,
    DescendingTriangle,
    SymmetricalTriangle,
}

impl PatternKind {
    pub fn is_triangle(self) -> bool {
        matches!(
            self,
            Self::AscendingTriangle | Self::DescendingTriangle | Self::SymmetricalTriangle
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: f64) -> Self {
        if score < 0.5 {
            Self::Low
        } else if score < 0.75 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternDetection {
    pub kind: PatternKind,
    /// Supporting pivots in time order.
    pub pivots: Vec<Pivot>,
    /// In [0, 1].
    pub confidence: f64,
    pub confidence_level: ConfidenceLevel,
    /// Trigger level: neckline, trough/peak between the twin extremes, or the
    /// triangle's flat side.
    pub price_level: f64,
    /// Measured-move projection; symmetrical triangles have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<f64>,
    /// Whether a close beyond `price_level` has already happened.
    pub confirmed: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl PatternDetection {
    pub(crate) fn new(
        kind: PatternKind,
        pivots: Vec<Pivot>,
        tightness: f64,
        confirmed: bool,
        price_level: f64,
        target: Option<f64>,
    ) -> Option<Self> {
        let start_date = pivots.first()?.date;
        let end_date = pivots.last()?.date;
        let structure = (pivots.len() as f64 / 5.0).min(1.0);
        let maturity = 0.5 * structure + if confirmed { 0.5 } else { 0.0 };
        let confidence = (0.5 * tightness.clamp(0.0, 1.0) + 0.5 * maturity).clamp(0.0, 1.0);
        Some(Self {
            kind,
            pivots,
            confidence,
            confidence_level: ConfidenceLevel::from_score(confidence),
            price_level,
            target,
            confirmed,
            start_date,
            end_date,
        })
    }
}

/// Pivots and detections over the pattern lookback window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    pub symbol: String,
    pub lookback_days: usize,
    /// Raw swing pivots (not collapsed), also used for technical stops.
    pub pivots: Vec<Pivot>,
    pub patterns: Vec<PatternDetection>,
}

/// Run pivot extraction and every matcher over the last `lookback_days` bars.
///
/// Too few pivots for any pattern yields an empty `patterns` list, not an
/// error. A zero-bar series or an invalid config fails.
pub fn detect_patterns(series: &BarSeries, config: &PatternConfig) -> Result<PatternAnalysis> {
    config.validate()?;
    if series.is_empty() {
        return Err(AnalysisError::insufficient(format!(
            "{}: series has zero bars",
            series.symbol()
        )));
    }

    let (start, window) = series.tail(config.lookback_days);
    let pivots = find_pivots(window, config.pivot_window, start);
    let swings = alternate(&pivots);

    let mut patterns = Vec::new();
    if swings.len() >= 3 {
        let bars = series.bars();
        patterns.extend(matchers::double_tops_and_bottoms(&swings, bars, config));
        patterns.extend(matchers::head_and_shoulders(&swings, bars, config));
        patterns.extend(matchers::triangle(&swings, bars, config));
    }

    tracing::debug!(
        symbol = %series.symbol(),
        bars = window.len(),
        pivots = pivots.len(),
        swings = swings.len(),
        patterns = patterns.len(),
        "pattern scan complete"
    );

    Ok(PatternAnalysis {
        symbol: series.symbol().to_string(),
        lookback_days: window.len(),
        pivots,
        patterns,
    })
}

/// Bars tracing straight lines between `(index, price)` waypoints, with
/// high/low half a point either side of the path.
#[cfg(test)]
pub(crate) fn path_bars(waypoints: &[(usize, f64)]) -> Vec<crate::domain::Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    let mut prices = vec![waypoints[0].1];
    for pair in waypoints.windows(2) {
        let ((i0, p0), (i1, p1)) = (pair[0], pair[1]);
        for i in (i0 + 1)..=i1 {
            prices.push(p0 + (p1 - p0) * (i - i0) as f64 / (i1 - i0) as f64);
        }
    }
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| {
            crate::domain::Bar::new(
                base + chrono::Duration::days(i as i64),
                p,
                p + 0.5,
                p - 0.5,
                p,
                1000.0,
            )
        })
        .collect()
}
