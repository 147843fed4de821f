//! Volume Profile Engine: traded volume binned by price level.
//!
//! Each bar's volume is spread uniformly over its [low, high] range, so a bin
//! receives `volume * overlap / range`. A bar with zero range puts all of its
//! volume in the bin containing its price.

use crate::config::{ValueAreaMethod, VolumeProfileConfig};
use crate::domain::{Bar, BarSeries};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Relative slack when comparing accumulated volume to the Value Area target.
const TARGET_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeBin {
    pub index: usize,
    pub price_low: f64,
    pub price_high: f64,
    pub price_mid: f64,
    pub volume: f64,
    /// Share of the profile's total volume, 0–100.
    pub volume_percent: f64,
}

/// Contiguous run of bins `[start_bin, end_bin]` around the POC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueArea {
    pub low: f64,
    pub high: f64,
    pub start_bin: usize,
    pub end_bin: usize,
    pub volume: f64,
    pub volume_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeProfile {
    pub symbol: String,
    /// Bars actually used (at most the configured lookback).
    pub lookback_days: usize,
    pub price_min: f64,
    pub price_max: f64,
    pub bin_width: f64,
    pub total_volume: f64,
    /// Empty when the window traded no volume.
    pub bins: Vec<VolumeBin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub point_of_control: Option<VolumeBin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_area: Option<ValueArea>,
    /// Heaviest bins, descending by volume.
    pub top_bins: Vec<VolumeBin>,
}

impl VolumeProfile {
    pub fn compute(series: &BarSeries, config: &VolumeProfileConfig) -> Result<Self> {
        config.validate()?;
        let last_close = series.last_close().ok_or_else(|| {
            AnalysisError::insufficient(format!("{}: series has zero bars", series.symbol()))
        })?;

        let (_, window) = series.tail(config.lookback_days);
        let price_min = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let price_max = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let total_volume: f64 = window.iter().map(|b| b.volume).sum();

        let mut profile = Self {
            symbol: series.symbol().to_string(),
            lookback_days: window.len(),
            price_min,
            price_max,
            bin_width: 0.0,
            total_volume,
            bins: Vec::new(),
            point_of_control: None,
            value_area: None,
            top_bins: Vec::new(),
        };

        if total_volume <= 0.0 {
            tracing::warn!(
                symbol = %profile.symbol,
                bars = window.len(),
                "zero traded volume in window; returning empty profile"
            );
            return Ok(profile);
        }

        // A flat window collapses to one bin.
        let num_bins = if price_max > price_min { config.num_bins } else { 1 };
        let bin_width = (price_max - price_min) / num_bins as f64;
        let volumes = distribute(window, price_min, price_max, num_bins);

        let bins: Vec<VolumeBin> = volumes
            .iter()
            .enumerate()
            .map(|(index, &volume)| {
                let price_low = price_min + index as f64 * bin_width;
                let price_high = if index + 1 == num_bins {
                    price_max
                } else {
                    price_min + (index + 1) as f64 * bin_width
                };
                VolumeBin {
                    index,
                    price_low,
                    price_high,
                    price_mid: (price_low + price_high) / 2.0,
                    volume,
                    volume_percent: volume / total_volume * 100.0,
                }
            })
            .collect();

        let poc = point_of_control(&bins, last_close);
        let target = config.value_area_pct * volumes.iter().sum::<f64>();
        let (start, end) = match config.value_area_method {
            ValueAreaMethod::Minimal => minimal_value_area(&volumes, poc, target),
            ValueAreaMethod::Greedy => greedy_value_area(&volumes, poc, target),
        };
        let va_volume: f64 = volumes[start..=end].iter().sum();

        let mut top_bins = bins.clone();
        top_bins.sort_by(|a, b| b.volume.total_cmp(&a.volume).then(a.index.cmp(&b.index)));
        top_bins.truncate(config.top_bins);

        profile.bin_width = bin_width;
        profile.value_area = Some(ValueArea {
            low: bins[start].price_low,
            high: bins[end].price_high,
            start_bin: start,
            end_bin: end,
            volume: va_volume,
            volume_percent: va_volume / total_volume * 100.0,
        });
        profile.point_of_control = Some(bins[poc].clone());
        profile.top_bins = top_bins;
        profile.bins = bins;

        tracing::debug!(
            symbol = %profile.symbol,
            bars = window.len(),
            bins = num_bins,
            poc,
            value_area_bins = end - start + 1,
            "volume profile computed"
        );
        Ok(profile)
    }
}

fn bin_of(price: f64, price_min: f64, bin_width: f64, num_bins: usize) -> usize {
    if bin_width <= 0.0 {
        return 0;
    }
    let idx = ((price - price_min) / bin_width).floor();
    if idx <= 0.0 {
        0
    } else {
        (idx as usize).min(num_bins - 1)
    }
}

fn distribute(window: &[Bar], price_min: f64, price_max: f64, num_bins: usize) -> Vec<f64> {
    let bin_width = (price_max - price_min) / num_bins as f64;
    let mut volumes = vec![0.0; num_bins];

    for bar in window {
        if bar.volume <= 0.0 {
            continue;
        }
        let range = bar.range();
        if range <= 0.0 {
            volumes[bin_of(bar.close, price_min, bin_width, num_bins)] += bar.volume;
            continue;
        }
        let first = bin_of(bar.low, price_min, bin_width, num_bins);
        let last = bin_of(bar.high, price_min, bin_width, num_bins);
        let mut assigned = 0.0;
        for (i, slot) in volumes.iter_mut().enumerate().take(last + 1).skip(first) {
            let lo = price_min + i as f64 * bin_width;
            let hi = if i + 1 == num_bins {
                price_max
            } else {
                price_min + (i + 1) as f64 * bin_width
            };
            let overlap = bar.high.min(hi) - bar.low.max(lo);
            if overlap > 0.0 {
                let share = bar.volume * overlap / range;
                *slot += share;
                assigned += share;
            }
        }
        // Rounding residue stays with the bar's top bin so bin totals match input.
        volumes[last] += bar.volume - assigned;
    }
    volumes
}

/// Heaviest bin; ties go to the bin whose midpoint is nearest the last close,
/// then to the lower bin.
fn point_of_control(bins: &[VolumeBin], last_close: f64) -> usize {
    let mut best = 0;
    for bin in &bins[1..] {
        let current = &bins[best];
        let better = bin.volume > current.volume
            || (bin.volume == current.volume
                && (bin.price_mid - last_close).abs() < (current.price_mid - last_close).abs());
        if better {
            best = bin.index;
        }
    }
    best
}

fn reaches(sum: f64, target: f64) -> bool {
    sum >= target - TARGET_SLACK * target.abs()
}

/// Narrowest contiguous run containing `poc` whose volume reaches `target`.
/// Among equally narrow runs the heavier wins, then the lower start.
fn minimal_value_area(volumes: &[f64], poc: usize, target: f64) -> (usize, usize) {
    let n = volumes.len();
    let mut prefix = vec![0.0; n + 1];
    for (i, v) in volumes.iter().enumerate() {
        prefix[i + 1] = prefix[i] + v;
    }

    for width in 1..=n {
        let lowest_start = (poc + 1).saturating_sub(width);
        let highest_start = poc.min(n - width);
        let mut best: Option<(usize, f64)> = None;
        for start in lowest_start..=highest_start {
            let sum = prefix[start + width] - prefix[start];
            if reaches(sum, target) && best.map_or(true, |(_, b)| sum > b) {
                best = Some((start, sum));
            }
        }
        if let Some((start, _)) = best {
            return (start, start + width - 1);
        }
    }
    (0, n - 1)
}

/// Market-profile expansion: add whichever neighbouring bin is heavier until
/// the target is reached. Ties extend upward.
fn greedy_value_area(volumes: &[f64], poc: usize, target: f64) -> (usize, usize) {
    let n = volumes.len();
    let (mut lo, mut hi) = (poc, poc);
    let mut sum = volumes[poc];

    while !reaches(sum, target) && (lo > 0 || hi + 1 < n) {
        let above = (hi + 1 < n).then(|| volumes[hi + 1]);
        let below = (lo > 0).then(|| volumes[lo - 1]);
        match (above, below) {
            (Some(a), Some(b)) if b > a => {
                lo -= 1;
                sum += b;
            }
            (Some(a), _) => {
                hi += 1;
                sum += a;
            }
            (None, Some(b)) => {
                lo -= 1;
                sum += b;
            }
            (None, None) => break,
        }
    }
    (lo, hi)
}
