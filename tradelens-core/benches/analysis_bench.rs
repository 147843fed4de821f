//! Criterion benchmarks for the analysis hot paths.
//!
//! Benchmarks:
//! 1. Full analysis (every section) over 1000 bars
//! 2. Indicator snapshot
//! 3. Volume profile, both Value Area methods
//! 4. Pivot extraction and pattern matching

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use tradelens_core::config::{
    IndicatorConfig, PatternConfig, ValueAreaMethod, VolumeProfileConfig,
};
use tradelens_core::indicators::IndicatorSnapshot;
use tradelens_core::patterns::detect_patterns;
use tradelens_core::risk::PositionSizeRequest;
use tradelens_core::volume_profile::VolumeProfile;
use tradelens_core::{AnalysisRequest, Analyzer, Bar, BarSeries};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(symbol: &str, n: usize, phase: f64) -> BarSeries {
    let base_date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let bars = (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1 + phase).sin() * 10.0 + i as f64 * 0.02;
            Bar::new(
                base_date + chrono::Duration::days(i as i64),
                close - 0.3,
                close + 1.5,
                close - 1.5,
                close,
                1_000_000.0 + (i % 500) as f64 * 1000.0,
            )
        })
        .collect();
    BarSeries::new(symbol, bars).unwrap()
}

// ── Benchmarks ───────────────────────────────────────────────────────

fn bench_full_analysis(c: &mut Criterion) {
    let series = make_series("BENCH", 1000, 0.0);
    let benchmark = make_series("SPY", 1000, 1.3);
    let analyzer = Analyzer::default();
    let request = AnalysisRequest::new(&series)
        .with_benchmark(&benchmark, "SPY")
        .with_position(PositionSizeRequest {
            price: None,
            stop_price: 95.0,
            risk_amount: 1000.0,
            account_size: 100_000.0,
        });

    c.bench_function("full_analysis_1000_bars", |b| {
        b.iter(|| analyzer.analyze(black_box(&request)).unwrap())
    });
}

fn bench_indicators(c: &mut Criterion) {
    let series = make_series("BENCH", 1000, 0.0);
    let config = IndicatorConfig::default();
    c.bench_function("indicator_snapshot_1000_bars", |b| {
        b.iter(|| IndicatorSnapshot::compute(black_box(&series), &config).unwrap())
    });
}

fn bench_volume_profile(c: &mut Criterion) {
    let series = make_series("BENCH", 1000, 0.0);
    let mut group = c.benchmark_group("volume_profile");
    for method in [ValueAreaMethod::Minimal, ValueAreaMethod::Greedy] {
        let config = VolumeProfileConfig {
            lookback_days: 1000,
            num_bins: 100,
            value_area_method: method,
            ..VolumeProfileConfig::default()
        };
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{method:?}")),
            &config,
            |b, config| b.iter(|| VolumeProfile::compute(black_box(&series), config).unwrap()),
        );
    }
    group.finish();
}

fn bench_patterns(c: &mut Criterion) {
    let series = make_series("BENCH", 1000, 0.0);
    let config = PatternConfig {
        lookback_days: 1000,
        ..PatternConfig::default()
    };
    c.bench_function("detect_patterns_1000_bars", |b| {
        b.iter(|| detect_patterns(black_box(&series), &config).unwrap())
    });
}

criterion_group!(
    benches,
    bench_full_analysis,
    bench_indicators,
    bench_volume_profile,
    bench_patterns
);
criterion_main!(benches);
