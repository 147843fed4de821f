//! Swing high / swing low extraction.

use crate::domain::Bar;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotKind {
    High,
    Low,
}

/// A local extremum. `index` is the bar's position in the full series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub index: usize,
    pub date: NaiveDate,
    pub price: f64,
    pub kind: PivotKind,
}

impl Pivot {
    /// True when `self` is at least as extreme as `other` in its own direction.
    fn dominates(&self, other: &Pivot) -> bool {
        match self.kind {
            PivotKind::High => self.price > other.price,
            PivotKind::Low => self.price < other.price,
        }
    }
}

/// Find swing highs and lows in `bars`.
///
/// A bar is a swing high when its high is strictly greater than the highs of
/// the `window` bars on each side (swing lows symmetric on the low). The first
/// and last `window` bars can never qualify. `offset` is added to each index so
/// pivots found in a tail slice keep their position in the full series.
pub fn find_pivots(bars: &[Bar], window: usize, offset: usize) -> Vec<Pivot> {
    let n = bars.len();
    let mut pivots = Vec::new();
    if window == 0 || n < 2 * window + 1 {
        return pivots;
    }

    for i in window..(n - window) {
        let neighbours = (i - window..=i + window).filter(|&j| j != i);
        let bar = &bars[i];

        if neighbours.clone().all(|j| bar.high > bars[j].high) {
            pivots.push(Pivot {
                index: offset + i,
                date: bar.date,
                price: bar.high,
                kind: PivotKind::High,
            });
        }
        if neighbours.clone().all(|j| bar.low < bars[j].low) {
            pivots.push(Pivot {
                index: offset + i,
                date: bar.date,
                price: bar.low,
                kind: PivotKind::Low,
            });
        }
    }
    pivots
}

/// Collapse runs of same-kind pivots to their most extreme member so the
/// sequence alternates high/low. Equal prices keep the earlier pivot.
pub fn alternate(pivots: &[Pivot]) -> Vec<Pivot> {
    let mut out: Vec<Pivot> = Vec::with_capacity(pivots.len());
    for pivot in pivots {
        match out.last_mut() {
            Some(last) if last.kind == pivot.kind => {
                if pivot.dominates(last) {
                    *last = *pivot;
                }
            }
            _ => out.push(*pivot),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    fn from_highs_lows(highs: &[f64], lows: &[f64]) -> Vec<Bar> {
        let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        highs
            .iter()
            .zip(lows)
            .enumerate()
            .map(|(i, (&high, &low))| {
                let mid = (high + low) / 2.0;
                Bar::new(
                    base + chrono::Duration::days(i as i64),
                    mid,
                    high,
                    low,
                    mid,
                    1000.0,
                )
            })
            .collect()
    }

    #[test]
    fn finds_single_peak_and_trough() {
        let highs = [10.0, 11.0, 12.0, 15.0, 12.0, 11.0, 10.0, 9.0, 10.0, 11.0, 12.0];
        let lows = [8.0, 9.0, 10.0, 13.0, 10.0, 9.0, 8.0, 5.0, 8.0, 9.0, 10.0];
        let pivots = find_pivots(&from_highs_lows(&highs, &lows), 2, 0);

        assert_eq!(pivots.len(), 2);
        assert_eq!(pivots[0].kind, PivotKind::High);
        assert_eq!(pivots[0].index, 3);
        assert_eq!(pivots[0].price, 15.0);
        assert_eq!(pivots[1].kind, PivotKind::Low);
        assert_eq!(pivots[1].index, 7);
        assert_eq!(pivots[1].price, 5.0);
    }

    #[test]
    fn offset_shifts_indices() {
        let highs = [1.0, 2.0, 5.0, 2.0, 1.0];
        let lows = [0.5, 1.5, 4.5, 1.5, 0.5];
        let pivots = find_pivots(&from_highs_lows(&highs, &lows), 1, 100);
        assert_eq!(pivots.len(), 1);
        assert_eq!(pivots[0].index, 102);
    }

    #[test]
    fn monotonic_series_has_no_pivots() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        assert!(find_pivots(&make_bars(&closes), 5, 0).is_empty());
    }

    #[test]
    fn flat_tops_are_not_pivots() {
        let bars = from_highs_lows(&[1.0, 3.0, 3.0, 1.0, 0.5], &[0.5, 2.0, 2.0, 0.5, 0.2]);
        assert!(find_pivots(&bars, 1, 0)
            .iter()
            .all(|p| p.kind != PivotKind::High));
    }

    #[test]
    fn too_short_for_window() {
        let bars = make_bars(&[1.0, 2.0, 1.0]);
        assert!(find_pivots(&bars, 2, 0).is_empty());
        assert!(find_pivots(&bars, 0, 0).is_empty());
    }

    #[test]
    fn alternate_keeps_most_extreme() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let p = |index, price, kind| Pivot {
            index,
            date,
            price,
            kind,
        };
        let raw = vec![
            p(1, 10.0, PivotKind::High),
            p(3, 12.0, PivotKind::High),
            p(5, 8.0, PivotKind::Low),
            p(7, 7.0, PivotKind::Low),
            p(9, 7.0, PivotKind::Low),
            p(11, 11.0, PivotKind::High),
        ];
        let alt = alternate(&raw);
        let idx: Vec<usize> = alt.iter().map(|p| p.index).collect();
        assert_eq!(idx, vec![3, 7, 11]);
    }
}
