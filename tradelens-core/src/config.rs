//! Serializable engine configuration.
//!
//! Every window length, tolerance and threshold the engines use lives here so
//! detection behavior is reproducible and tunable from a TOML file. Missing
//! sections or keys fall back to the defaults.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration for an `Analyzer`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub indicators: IndicatorConfig,
    pub volume_profile: VolumeProfileConfig,
    pub patterns: PatternConfig,
    pub relative_strength: RelativeStrengthConfig,
    pub risk: RiskConfig,
}

impl EngineConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> std::result::Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("read config file: {e}"))?;
        Self::from_toml(&content)
    }

    /// Parse a configuration from a TOML string.
    pub fn from_toml(content: &str) -> std::result::Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("parse config TOML: {e}"))
    }

    /// Serialize the configuration to TOML.
    pub fn to_toml(&self) -> std::result::Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("serialize config: {e}"))
    }

    /// Reject values no engine can work with.
    pub fn validate(&self) -> Result<()> {
        self.indicators.validate()?;
        self.volume_profile.validate()?;
        self.patterns.validate()?;
        self.relative_strength.validate()?;
        self.risk.validate()
    }
}

/// Indicator windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// Simple moving average windows, reported individually.
    pub sma_periods: Vec<usize>,
    pub rsi_period: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub atr_period: usize,
    /// Average daily range percentage window.
    pub adrp_period: usize,
    pub volume_sma_period: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            sma_periods: vec![20, 50, 200],
            rsi_period: 14,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            atr_period: 14,
            adrp_period: 20,
            volume_sma_period: 20,
        }
    }
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sma_periods.iter().any(|&p| p == 0) {
            return Err(AnalysisError::invalid("sma_periods", "periods must be >= 1"));
        }
        let windows = [
            ("rsi_period", self.rsi_period),
            ("macd_fast", self.macd_fast),
            ("macd_slow", self.macd_slow),
            ("macd_signal", self.macd_signal),
            ("atr_period", self.atr_period),
            ("adrp_period", self.adrp_period),
            ("volume_sma_period", self.volume_sma_period),
        ];
        for (name, value) in windows {
            if value == 0 {
                return Err(AnalysisError::invalid(name, "must be >= 1"));
            }
        }
        if self.macd_fast >= self.macd_slow {
            return Err(AnalysisError::invalid(
                "macd_fast",
                format!(
                    "fast period {} must be shorter than slow period {}",
                    self.macd_fast, self.macd_slow
                ),
            ));
        }
        Ok(())
    }
}

/// How the Value Area is grown around the Point of Control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueAreaMethod {
    /// Narrowest contiguous run of bins containing the POC that reaches the
    /// target share; ties go to the run with more volume.
    #[default]
    Minimal,
    /// Classic market-profile expansion: repeatedly add the neighbouring bin
    /// (above or below) holding more volume.
    Greedy,
}

/// Volume profile binning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeProfileConfig {
    pub lookback_days: usize,
    pub num_bins: usize,
    /// Share of total volume the Value Area must contain, in (0, 1].
    pub value_area_pct: f64,
    /// How many of the heaviest bins to report.
    pub top_bins: usize,
    pub value_area_method: ValueAreaMethod,
}

impl Default for VolumeProfileConfig {
    fn default() -> Self {
        Self {
            lookback_days: 60,
            num_bins: 24,
            value_area_pct: 0.70,
            top_bins: 5,
            value_area_method: ValueAreaMethod::Minimal,
        }
    }
}

impl VolumeProfileConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(AnalysisError::invalid("lookback_days", "must be >= 1"));
        }
        if self.num_bins == 0 {
            return Err(AnalysisError::invalid("num_bins", "must be >= 1"));
        }
        if !(self.value_area_pct > 0.0 && self.value_area_pct <= 1.0) {
            return Err(AnalysisError::invalid(
                "value_area_pct",
                format!("{} is outside (0, 1]", self.value_area_pct),
            ));
        }
        Ok(())
    }
}

/// Pivot extraction and pattern matching tolerances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub lookback_days: usize,
    /// Bars on each side a swing high/low must dominate.
    pub pivot_window: usize,
    /// Maximum relative difference between the two peaks/troughs of a double
    /// top/bottom.
    pub price_tolerance: f64,
    /// Minimum bar distance between the two peaks/troughs of a double
    /// top/bottom.
    pub min_separation_bars: usize,
    /// Maximum relative difference between the two shoulders.
    pub shoulder_tolerance: f64,
    /// Maximum relative difference between the two neckline pivots.
    pub neckline_tolerance: f64,
    /// Minimum number of contracting swings for a triangle.
    pub min_triangle_swings: usize,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            lookback_days: 90,
            pivot_window: 5,
            price_tolerance: 0.03,
            min_separation_bars: 5,
            shoulder_tolerance: 0.05,
            neckline_tolerance: 0.05,
            min_triangle_swings: 4,
        }
    }
}

impl PatternConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lookback_days == 0 {
            return Err(AnalysisError::invalid("lookback_days", "must be >= 1"));
        }
        if self.pivot_window == 0 {
            return Err(AnalysisError::invalid("pivot_window", "must be >= 1"));
        }
        let tolerances = [
            ("price_tolerance", self.price_tolerance),
            ("shoulder_tolerance", self.shoulder_tolerance),
            ("neckline_tolerance", self.neckline_tolerance),
        ];
        for (name, value) in tolerances {
            if !(value > 0.0 && value < 1.0) {
                return Err(AnalysisError::invalid(
                    name,
                    format!("{value} is outside (0, 1)"),
                ));
            }
        }
        if self.min_triangle_swings < 3 {
            return Err(AnalysisError::invalid("min_triangle_swings", "must be >= 3"));
        }
        Ok(())
    }
}

/// Relative strength horizons and weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelativeStrengthConfig {
    /// Lookback horizons in trading days.
    pub horizons: Vec<usize>,
    /// Composite weight per horizon, same order as `horizons`.
    pub weights: Vec<f64>,
    /// Return differences within +/- this band classify as inline.
    pub inline_band: f64,
}

impl Default for RelativeStrengthConfig {
    fn default() -> Self {
        Self {
            horizons: vec![21, 63, 126, 252],
            weights: vec![0.4, 0.3, 0.2, 0.1],
            inline_band: 0.0,
        }
    }
}

impl RelativeStrengthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.horizons.is_empty() || self.horizons.iter().any(|&h| h == 0) {
            return Err(AnalysisError::invalid(
                "horizons",
                "need at least one horizon, each >= 1",
            ));
        }
        if self.weights.len() != self.horizons.len() {
            return Err(AnalysisError::invalid(
                "weights",
                format!(
                    "{} weights for {} horizons",
                    self.weights.len(),
                    self.horizons.len()
                ),
            ));
        }
        if self.weights.iter().any(|w| !w.is_finite() || *w <= 0.0) {
            return Err(AnalysisError::invalid("weights", "weights must be positive"));
        }
        if !self.inline_band.is_finite() || self.inline_band < 0.0 {
            return Err(AnalysisError::invalid("inline_band", "must be >= 0"));
        }
        Ok(())
    }
}

/// Stop suggestion and profit target policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub atr_multiples: Vec<f64>,
    /// Fixed-percentage stop distances as fractions (0.02 = 2%).
    pub percent_stops: Vec<f64>,
    pub r_multiples: Vec<f64>,
    /// Caps the risk budget at this percent of the account when set.
    pub max_risk_percent: Option<f64>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            atr_multiples: vec![1.0, 2.0, 3.0],
            percent_stops: vec![0.02, 0.05, 0.08],
            r_multiples: vec![1.0, 2.0, 3.0],
            max_risk_percent: None,
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> Result<()> {
        if self.atr_multiples.iter().any(|m| !m.is_finite() || *m <= 0.0) {
            return Err(AnalysisError::invalid("atr_multiples", "must be positive"));
        }
        if self
            .percent_stops
            .iter()
            .any(|p| !(p.is_finite() && *p > 0.0 && *p < 1.0))
        {
            return Err(AnalysisError::invalid(
                "percent_stops",
                "fractions must be in (0, 1)",
            ));
        }
        if self.r_multiples.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(AnalysisError::invalid("r_multiples", "must be positive"));
        }
        if let Some(pct) = self.max_risk_percent {
            if !(pct > 0.0 && pct <= 100.0) {
                return Err(AnalysisError::invalid(
                    "max_risk_percent",
                    format!("{pct} is outside (0, 100]"),
                ));
            }
        }
        Ok(())
    }
}
