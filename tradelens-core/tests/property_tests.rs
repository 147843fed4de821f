//! Property tests for engine invariants.
//!
//! Uses proptest to verify:
//! 1. SMA equals the arithmetic mean of the trailing window
//! 2. RSI stays within [0, 100] and saturates on one-way series
//! 3. Volume profile conserves volume and its Value Area is the narrowest
//!    window around the POC that reaches the target
//! 4. A series compared with itself is inline with RS score 50
//! 5. Position sizing never exceeds the risk budget or the account
//! 6. Analysis is a pure function of its inputs

use chrono::NaiveDate;
use proptest::prelude::*;
use tradelens_core::config::{RelativeStrengthConfig, RiskConfig, ValueAreaMethod, VolumeProfileConfig};
use tradelens_core::indicators::{Indicator, Rsi, Sma};
use tradelens_core::relative_strength::{compute_relative_strength, Classification};
use tradelens_core::risk::{size_position, PositionSizeRequest};
use tradelens_core::volume_profile::VolumeProfile;
use tradelens_core::{AnalysisRequest, Analyzer, Bar, BarSeries};

// ── Strategies (proptest) ────────────────────────────────────────────

/// (close, spread above, spread below, volume) per bar.
fn arb_bar_parts(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<(f64, f64, f64, f64)>> {
    prop::collection::vec(
        (20.0..200.0_f64, 0.0..5.0_f64, 0.0..5.0_f64, 0.0..1_000_000.0_f64),
        len,
    )
}

fn build_series(parts: &[(f64, f64, f64, f64)]) -> BarSeries {
    let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
    let bars = parts
        .iter()
        .enumerate()
        .map(|(i, &(close, up, down, volume))| {
            Bar::new(
                base + chrono::Duration::days(i as i64),
                close,
                close + up,
                close - down,
                close,
                volume,
            )
        })
        .collect();
    BarSeries::new("PROP", bars).unwrap()
}

fn closes_series(closes: &[f64]) -> BarSeries {
    let parts: Vec<_> = closes.iter().map(|&c| (c, 1.0, 1.0, 1000.0)).collect();
    build_series(&parts)
}

// ── 1. SMA ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn sma_is_trailing_mean(closes in prop::collection::vec(1.0..500.0_f64, 20..80), period in 1usize..20) {
        let series = closes_series(&closes);
        let out = Sma::new(period).compute(series.bars());
        let n = closes.len();
        let expected = closes[n - period..].iter().sum::<f64>() / period as f64;
        prop_assert!((out[n - 1] - expected).abs() < 1e-9 * expected.max(1.0));
    }
}

// ── 2. RSI ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn rsi_is_bounded(closes in prop::collection::vec(1.0..500.0_f64, 16..120)) {
        let series = closes_series(&closes);
        for v in Rsi::new(14).compute(series.bars()).into_iter().filter(|v| !v.is_nan()) {
            prop_assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn rsi_saturates_on_monotonic_series(start in 10.0..100.0_f64, step in 0.01..5.0_f64, n in 16usize..60) {
        let up: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
        let down: Vec<f64> = up.iter().rev().copied().collect();
        let rsi = Rsi::new(14);
        prop_assert_eq!(rsi.compute(closes_series(&up).bars())[n - 1], 100.0);
        prop_assert_eq!(rsi.compute(closes_series(&down).bars())[n - 1], 0.0);
    }
}

// ── 3. Volume profile ────────────────────────────────────────────────

proptest! {
    #[test]
    fn volume_profile_conserves_volume(parts in arb_bar_parts(1..80), bins in 1usize..40) {
        let series = build_series(&parts);
        let config = VolumeProfileConfig { num_bins: bins, ..VolumeProfileConfig::default() };
        let profile = VolumeProfile::compute(&series, &config).unwrap();
        let binned: f64 = profile.bins.iter().map(|b| b.volume).sum();
        if profile.total_volume > 0.0 {
            prop_assert!((binned - profile.total_volume).abs() <= 1e-6 * profile.total_volume);
        } else {
            prop_assert!(profile.bins.is_empty());
        }
    }

    #[test]
    fn value_area_reaches_target_and_contains_poc(
        parts in arb_bar_parts(1..80),
        greedy in any::<bool>(),
    ) {
        let series = build_series(&parts);
        let config = VolumeProfileConfig {
            value_area_method: if greedy { ValueAreaMethod::Greedy } else { ValueAreaMethod::Minimal },
            ..VolumeProfileConfig::default()
        };
        let profile = VolumeProfile::compute(&series, &config).unwrap();
        if let (Some(va), Some(poc)) = (&profile.value_area, &profile.point_of_control) {
            prop_assert!(va.volume_percent >= 70.0 - 1e-6);
            prop_assert!(va.start_bin <= poc.index && poc.index <= va.end_bin);
            // POC is the heaviest bin.
            prop_assert!(profile.bins.iter().all(|b| b.volume <= poc.volume));
        }
    }

    #[test]
    fn no_narrower_window_reaches_value_area_target(
        parts in arb_bar_parts(5..80),
        bins in 2usize..40,
    ) {
        let series = build_series(&parts);
        let config = VolumeProfileConfig { num_bins: bins, ..VolumeProfileConfig::default() };
        let profile = VolumeProfile::compute(&series, &config).unwrap();
        if let (Some(va), Some(poc)) = (&profile.value_area, &profile.point_of_control) {
            let volumes: Vec<f64> = profile.bins.iter().map(|b| b.volume).collect();
            let total: f64 = volumes.iter().sum();
            let target = config.value_area_pct * total;
            let width = va.end_bin - va.start_bin + 1;
            if width > 1 {
                let narrower = width - 1;
                let first = (poc.index + 1).saturating_sub(narrower);
                let last = poc.index.min(volumes.len() - narrower);
                for start in first..=last {
                    let sum: f64 = volumes[start..start + narrower].iter().sum();
                    prop_assert!(
                        sum < target * (1.0 - 1e-9) + 1e-9 * total,
                        "bins {}..{} hold {} of target {}", start, start + narrower, sum, target
                    );
                }
            }
        }
    }

    #[test]
    fn minimal_value_area_is_never_wider_than_greedy(parts in arb_bar_parts(5..80)) {
        let series = build_series(&parts);
        let minimal = VolumeProfile::compute(&series, &VolumeProfileConfig::default()).unwrap();
        let greedy = VolumeProfile::compute(
            &series,
            &VolumeProfileConfig { value_area_method: ValueAreaMethod::Greedy, ..VolumeProfileConfig::default() },
        )
        .unwrap();
        if let (Some(m), Some(g)) = (minimal.value_area, greedy.value_area) {
            prop_assert!(m.end_bin - m.start_bin <= g.end_bin - g.start_bin);
        }
    }
}

// ── 4. Relative strength ─────────────────────────────────────────────

proptest! {
    #[test]
    fn self_comparison_is_inline(parts in arb_bar_parts(2..300)) {
        let series = build_series(&parts);
        let rs = compute_relative_strength(&series, &series, "SELF", &RelativeStrengthConfig::default()).unwrap();
        prop_assert_eq!(rs.aligned_bars, parts.len());
        for h in &rs.horizons {
            prop_assert_eq!(h.difference, 0.0);
            prop_assert_eq!(h.classification, Classification::Inline);
            prop_assert_eq!(h.rs_score, 50.0);
        }
        prop_assert_eq!(rs.horizons.len() + rs.omitted_horizons.len(), 4);
    }
}

// ── 5. Position sizing ───────────────────────────────────────────────

proptest! {
    #[test]
    fn sizing_respects_budget_and_account(
        price in 1.0..1000.0_f64,
        stop_frac in 0.01..0.5_f64,
        long in any::<bool>(),
        risk in 10.0..10_000.0_f64,
        account in 1_000.0..1_000_000.0_f64,
    ) {
        let stop = if long { price * (1.0 - stop_frac) } else { price * (1.0 + stop_frac) };
        let request = PositionSizeRequest { price: Some(price), stop_price: stop, risk_amount: risk, account_size: account };
        let sized = size_position(&request, None, &RiskConfig::default()).unwrap();
        prop_assert!(sized.dollar_risk <= risk + 1e-6);
        prop_assert!(sized.position_cost <= account + 1e-6);
        // One more share would break one of the two limits.
        let next = sized.shares as f64 + 1.0;
        prop_assert!(next * sized.risk_per_share > risk - 1e-6 || next * price > account - 1e-6);
    }
}

// ── 6. Purity ────────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn analysis_is_idempotent(parts in arb_bar_parts(1..260)) {
        let series = build_series(&parts);
        let before = series.clone();
        let analyzer = Analyzer::default();
        let request = AnalysisRequest::new(&series);
        let first = analyzer.analyze(&request).unwrap();
        let second = analyzer.analyze(&request).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(series, before);
    }
}
