//! Result assembler: runs the requested engines over one bar series.
//!
//! Indicator, volume profile, pattern and relative strength engines are
//! independent and run in parallel with `rayon::join`. The Risk Engine runs
//! afterwards because stop suggestions read the indicator ATR, the SMA
//! readings and the pattern pivots.

use crate::config::EngineConfig;
use crate::domain::BarSeries;
use crate::error::{AnalysisError, Result};
use crate::indicators::IndicatorSnapshot;
use crate::patterns::{detect_patterns, PatternAnalysis};
use crate::relative_strength::{compute_relative_strength, RelativeStrengthResult};
use crate::risk::{
    size_position, suggest_stops, Direction, PositionSize, PositionSizeRequest, StopSuggestion,
};
use crate::volume_profile::VolumeProfile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Which parts of an [`AnalysisResult`] to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sections {
    pub indicators: bool,
    pub volume_profile: bool,
    pub patterns: bool,
    pub relative_strength: bool,
    pub position_size: bool,
    pub stop_suggestions: bool,
}

impl Default for Sections {
    fn default() -> Self {
        Self::all()
    }
}

impl Sections {
    pub fn all() -> Self {
        Self {
            indicators: true,
            volume_profile: true,
            patterns: true,
            relative_strength: true,
            position_size: true,
            stop_suggestions: true,
        }
    }

    pub fn none() -> Self {
        Self {
            indicators: false,
            volume_profile: false,
            patterns: false,
            relative_strength: false,
            position_size: false,
            stop_suggestions: false,
        }
    }
}

/// Benchmark series plus the identifier printed in the output.
#[derive(Debug, Clone, Copy)]
pub struct Benchmark<'a> {
    pub series: &'a BarSeries,
    pub label: &'a str,
}

/// One analysis call.
#[derive(Debug, Clone)]
pub struct AnalysisRequest<'a> {
    pub series: &'a BarSeries,
    pub sections: Sections,
    pub benchmark: Option<Benchmark<'a>>,
    pub position: Option<PositionSizeRequest>,
    /// Side for stop suggestions; inferred from `position` when absent, else long.
    pub direction: Option<Direction>,
    /// Overrides `volume_profile.lookback_days`.
    pub volume_lookback_days: Option<usize>,
    /// Overrides `patterns.lookback_days`.
    pub pattern_lookback_days: Option<usize>,
}

impl<'a> AnalysisRequest<'a> {
    /// Every section that needs no extra input: relative strength and position
    /// sizing switch on when a benchmark / position is attached.
    pub fn new(series: &'a BarSeries) -> Self {
        Self {
            series,
            sections: Sections {
                relative_strength: false,
                position_size: false,
                ..Sections::all()
            },
            benchmark: None,
            position: None,
            direction: None,
            volume_lookback_days: None,
            pattern_lookback_days: None,
        }
    }

    pub fn with_sections(mut self, sections: Sections) -> Self {
        self.sections = sections;
        self
    }

    pub fn with_benchmark(mut self, series: &'a BarSeries, label: &'a str) -> Self {
        self.benchmark = Some(Benchmark { series, label });
        self.sections.relative_strength = true;
        self
    }

    pub fn with_position(mut self, position: PositionSizeRequest) -> Self {
        self.position = Some(position);
        self.sections.position_size = true;
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_volume_lookback(mut self, days: usize) -> Self {
        self.volume_lookback_days = Some(days);
        self
    }

    pub fn with_pattern_lookback(mut self, days: usize) -> Self {
        self.pattern_lookback_days = Some(days);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub symbol: String,
    pub as_of: NaiveDate,
    pub bars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicators: Option<IndicatorSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume_profile: Option<VolumeProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<PatternAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_strength: Option<RelativeStrengthResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_size: Option<PositionSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_suggestions: Option<Vec<StopSuggestion>>,
}

/// Stateless engine front end. Cheap to share across threads.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: EngineConfig,
}

impl Analyzer {
    /// Build an analyzer, rejecting configurations no engine can run with.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn analyze(&self, request: &AnalysisRequest<'_>) -> Result<AnalysisResult> {
        let series = request.series;
        let last = series.last().ok_or_else(|| {
            AnalysisError::insufficient(format!("{}: series has zero bars", series.symbol()))
        })?;
        let sections = request.sections;

        let benchmark = match (sections.relative_strength, request.benchmark) {
            (true, None) => {
                return Err(AnalysisError::invalid(
                    "benchmark",
                    "relative strength requested without a benchmark series",
                ))
            }
            (true, Some(b)) => Some(b),
            (false, _) => None,
        };
        let position = match (sections.position_size, &request.position) {
            (true, None) => {
                return Err(AnalysisError::invalid(
                    "position",
                    "position sizing requested without risk parameters",
                ))
            }
            (true, Some(p)) => Some(p),
            (false, _) => None,
        };

        let mut volume_cfg = self.config.volume_profile.clone();
        if let Some(days) = request.volume_lookback_days {
            volume_cfg.lookback_days = days;
        }
        let mut pattern_cfg = self.config.patterns.clone();
        if let Some(days) = request.pattern_lookback_days {
            pattern_cfg.lookback_days = days;
        }

        let need_indicators = sections.indicators || sections.stop_suggestions;
        let need_patterns = sections.patterns || sections.stop_suggestions;

        let ((indicators, volume_profile), (patterns, relative_strength)) = rayon::join(
            || {
                rayon::join(
                    || {
                        need_indicators
                            .then(|| IndicatorSnapshot::compute(series, &self.config.indicators))
                            .transpose()
                    },
                    || {
                        sections
                            .volume_profile
                            .then(|| VolumeProfile::compute(series, &volume_cfg))
                            .transpose()
                    },
                )
            },
            || {
                rayon::join(
                    || {
                        need_patterns
                            .then(|| detect_patterns(series, &pattern_cfg))
                            .transpose()
                    },
                    || {
                        benchmark
                            .map(|b| {
                                compute_relative_strength(
                                    series,
                                    b.series,
                                    b.label,
                                    &self.config.relative_strength,
                                )
                            })
                            .transpose()
                    },
                )
            },
        );
        let (indicators, volume_profile) = (indicators?, volume_profile?);
        let (patterns, relative_strength) = (patterns?, relative_strength?);

        let position_size = position
            .map(|p| size_position(p, Some(last.close), &self.config.risk))
            .transpose()?;

        let stop_suggestions = if sections.stop_suggestions {
            let price = position.and_then(|p| p.price).unwrap_or(last.close);
            let direction = request
                .direction
                .or_else(|| position_size.as_ref().map(|p| p.direction))
                .unwrap_or(Direction::Long);
            let atr = indicators.as_ref().and_then(|s| s.atr);
            let moving_averages: Vec<(usize, f64)> = indicators
                .as_ref()
                .map(|s| s.sma.iter().map(|(p, r)| (*p, r.value)).collect())
                .unwrap_or_default();
            let pivots = patterns.as_ref().map(|p| p.pivots.as_slice()).unwrap_or(&[]);
            Some(suggest_stops(
                price,
                direction,
                atr,
                pivots,
                &moving_averages,
                &self.config.risk,
            )?)
        } else {
            None
        };

        tracing::info!(
            symbol = %series.symbol(),
            bars = series.len(),
            as_of = %last.date,
            indicators = sections.indicators,
            volume_profile = sections.volume_profile,
            patterns = patterns.as_ref().map_or(0, |p| p.patterns.len()),
            relative_strength = relative_strength.is_some(),
            position_size = position_size.is_some(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            symbol: series.symbol().to_string(),
            as_of: last.date,
            bars: series.len(),
            indicators: indicators.filter(|_| sections.indicators),
            volume_profile,
            patterns: patterns.filter(|_| sections.patterns),
            relative_strength,
            position_size,
            stop_suggestions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn series(n: usize) -> BarSeries {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + (i as f64 * 0.15).sin() * 10.0 + i as f64 * 0.05)
            .collect();
        BarSeries::new("TEST", make_bars(&closes)).unwrap()
    }

    #[test]
    fn default_request_skips_rs_and_sizing() {
        let s = series(260);
        let result = Analyzer::default().analyze(&AnalysisRequest::new(&s)).unwrap();
        assert!(result.indicators.is_some());
        assert!(result.volume_profile.is_some());
        assert!(result.patterns.is_some());
        assert!(result.stop_suggestions.is_some());
        assert!(result.relative_strength.is_none());
        assert!(result.position_size.is_none());
        assert_eq!(result.bars, 260);
    }

    #[test]
    fn stops_only_hides_supporting_sections() {
        let s = series(120);
        let request = AnalysisRequest::new(&s).with_sections(Sections {
            stop_suggestions: true,
            ..Sections::none()
        });
        let result = Analyzer::default().analyze(&request).unwrap();
        assert!(result.indicators.is_none());
        assert!(result.patterns.is_none());
        let stops = result.stop_suggestions.unwrap();
        assert!(stops.iter().any(|s| s.kind == crate::risk::StopKind::Atr));
    }

    #[test]
    fn relative_strength_without_benchmark_is_invalid() {
        let s = series(50);
        let request = AnalysisRequest::new(&s).with_sections(Sections::all());
        let err = Analyzer::default().analyze(&request).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { name: "benchmark", .. }));
    }

    #[test]
    fn empty_series_is_insufficient() {
        let s = BarSeries::new("EMPTY", vec![]).unwrap();
        let err = Analyzer::default()
            .analyze(&AnalysisRequest::new(&s))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InsufficientData { .. }));
    }

    #[test]
    fn position_direction_drives_stop_side() {
        let s = series(100);
        let close = s.last_close().unwrap();
        let request = AnalysisRequest::new(&s).with_position(PositionSizeRequest {
            price: None,
            stop_price: close * 1.05,
            risk_amount: 500.0,
            account_size: 50_000.0,
        });
        let result = Analyzer::default().analyze(&request).unwrap();
        assert_eq!(result.position_size.unwrap().direction, Direction::Short);
        assert!(result
            .stop_suggestions
            .unwrap()
            .iter()
            .all(|stop| stop.price > close));
    }

    #[test]
    fn lookback_overrides_apply() {
        let s = series(200);
        let request = AnalysisRequest::new(&s)
            .with_volume_lookback(30)
            .with_pattern_lookback(120);
        let result = Analyzer::default().analyze(&request).unwrap();
        assert_eq!(result.volume_profile.unwrap().lookback_days, 30);
        assert_eq!(result.patterns.unwrap().lookback_days, 120);
    }

    #[test]
    fn invalid_config_rejected_up_front() {
        let mut config = EngineConfig::default();
        config.volume_profile.num_bins = 0;
        assert!(Analyzer::new(config).is_err());
    }
}
