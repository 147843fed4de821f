//! Geometric matchers over an alternating pivot sequence.
//!
//! Every matcher expects `swings` to alternate high/low (see
//! [`super::alternate`]) and `bars` to be the full series the pivot indices
//! point into.

use super::{PatternDetection, PatternKind, Pivot, PivotKind};
use crate::config::PatternConfig;
use crate::domain::Bar;

/// `|a - b|` relative to the larger magnitude; 0 when both are 0.
fn relative_diff(a: f64, b: f64) -> f64 {
    let scale = a.abs().max(b.abs());
    if scale == 0.0 {
        0.0
    } else {
        (a - b).abs() / scale
    }
}

/// Closes strictly after bar `index`, paired with their bar index.
fn closes_after(bars: &[Bar], index: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
    bars.iter()
        .enumerate()
        .skip(index + 1)
        .map(|(i, bar)| (i, bar.close))
}

/// Double tops (H-L-H) and double bottoms (L-H-L).
pub fn double_tops_and_bottoms(
    swings: &[Pivot],
    bars: &[Bar],
    config: &PatternConfig,
) -> Vec<PatternDetection> {
    swings
        .windows(3)
        .filter_map(|w| twin_extremes(w, bars, config))
        .collect()
}

fn twin_extremes(w: &[Pivot], bars: &[Bar], config: &PatternConfig) -> Option<PatternDetection> {
    let (first, middle, second) = (w[0], w[1], w[2]);
    if second.index - first.index < config.min_separation_bars {
        return None;
    }
    let diff = relative_diff(first.price, second.price);
    if diff > config.price_tolerance {
        return None;
    }

    let extreme = (first.price + second.price) / 2.0;
    let level = middle.price;
    let height = (extreme - level).abs();

    let (kind, target, confirmed) = match first.kind {
        PivotKind::High => {
            if level >= first.price.min(second.price) {
                return None;
            }
            let broke = closes_after(bars, second.index).any(|(_, c)| c < level);
            (PatternKind::DoubleTop, (level - height).max(0.0), broke)
        }
        PivotKind::Low => {
            if level <= first.price.max(second.price) {
                return None;
            }
            let broke = closes_after(bars, second.index).any(|(_, c)| c > level);
            (PatternKind::DoubleBottom, level + height, broke)
        }
    };

    PatternDetection::new(
        kind,
        w.to_vec(),
        1.0 - diff / config.price_tolerance,
        confirmed,
        level,
        Some(target),
    )
}

/// Head-and-shoulders (H-L-H-L-H) and its inverse (L-H-L-H-L).
pub fn head_and_shoulders(
    swings: &[Pivot],
    bars: &[Bar],
    config: &PatternConfig,
) -> Vec<PatternDetection> {
    swings
        .windows(5)
        .filter_map(|w| shoulders(w, bars, config))
        .collect()
}

fn shoulders(w: &[Pivot], bars: &[Bar], config: &PatternConfig) -> Option<PatternDetection> {
    let (left, neck_a, head, neck_b, right) = (w[0], w[1], w[2], w[3], w[4]);
    let top = left.kind == PivotKind::High;

    let head_stands_out = if top {
        head.price > left.price && head.price > right.price
    } else {
        head.price < left.price && head.price < right.price
    };
    if !head_stands_out {
        return None;
    }

    let shoulder_diff = relative_diff(left.price, right.price);
    let neck_diff = relative_diff(neck_a.price, neck_b.price);
    if shoulder_diff > config.shoulder_tolerance || neck_diff > config.neckline_tolerance {
        return None;
    }

    let slope = (neck_b.price - neck_a.price) / (neck_b.index - neck_a.index) as f64;
    let neckline_at = |i: usize| neck_a.price + slope * (i as f64 - neck_a.index as f64);
    let neckline = neckline_at(head.index);
    let height = (head.price - neckline).abs();

    let (kind, target) = if top {
        (PatternKind::HeadAndShoulders, (neckline - height).max(0.0))
    } else {
        (PatternKind::InverseHeadAndShoulders, neckline + height)
    };
    let confirmed = closes_after(bars, right.index).any(|(i, c)| {
        if top {
            c < neckline_at(i)
        } else {
            c > neckline_at(i)
        }
    });

    let tightness = 1.0
        - 0.5 * (shoulder_diff / config.shoulder_tolerance + neck_diff / config.neckline_tolerance);

    PatternDetection::new(kind, w.to_vec(), tightness, confirmed, neckline, Some(target))
}

/// Contracting triangle over the trailing run of strictly shrinking swings.
///
/// Flat highs with rising lows are ascending, flat lows with falling highs are
/// descending, converging on both sides is symmetrical. "Flat" means the
/// first-to-last change stays within `price_tolerance`. Wedges (both sides
/// moving the same way) are not reported.
pub fn triangle(swings: &[Pivot], bars: &[Bar], config: &PatternConfig) -> Option<PatternDetection> {
    if swings.len() < 2 {
        return None;
    }
    let amplitudes: Vec<f64> = swings
        .windows(2)
        .map(|w| (w[1].price - w[0].price).abs())
        .collect();

    let mut first = amplitudes.len() - 1;
    while first > 0 && amplitudes[first - 1] > amplitudes[first] {
        first -= 1;
    }
    if amplitudes.len() - first < config.min_triangle_swings {
        return None;
    }

    let run = &swings[first..];
    let highs: Vec<&Pivot> = run.iter().filter(|p| p.kind == PivotKind::High).collect();
    let lows: Vec<&Pivot> = run.iter().filter(|p| p.kind == PivotKind::Low).collect();
    let (first_high, last_high) = (highs.first()?, highs.last()?);
    let (first_low, last_low) = (lows.first()?, lows.last()?);

    let high_change = (last_high.price - first_high.price) / first_high.price;
    let low_change = (last_low.price - first_low.price) / first_low.price;
    let tol = config.price_tolerance;
    let flat = |change: f64| change.abs() <= tol;

    let kind = if flat(high_change) && low_change > tol {
        PatternKind::AscendingTriangle
    } else if flat(low_change) && high_change < -tol {
        PatternKind::DescendingTriangle
    } else if high_change < 0.0 && low_change > 0.0 {
        PatternKind::SymmetricalTriangle
    } else {
        return None;
    };

    let height = amplitudes[first];
    let last = run.last()?;
    let resistance = highs.iter().map(|p| p.price).sum::<f64>() / highs.len() as f64;
    let support = lows.iter().map(|p| p.price).sum::<f64>() / lows.len() as f64;

    let (level, target, confirmed) = match kind {
        PatternKind::AscendingTriangle => (
            resistance,
            Some(resistance + height),
            closes_after(bars, last.index).any(|(_, c)| c > resistance),
        ),
        PatternKind::DescendingTriangle => (
            support,
            Some((support - height).max(0.0)),
            closes_after(bars, last.index).any(|(_, c)| c < support),
        ),
        _ => (
            (last_high.price + last_low.price) / 2.0,
            None,
            closes_after(bars, last.index)
                .any(|(_, c)| c > last_high.price || c < last_low.price),
        ),
    };

    let tightness = 1.0 - amplitudes[amplitudes.len() - 1] / height;
    PatternDetection::new(kind, run.to_vec(), tightness, confirmed, level, target)
}
