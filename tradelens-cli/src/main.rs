//! TradeLens CLI: analysis, position sizing and data download commands.
//!
//! Commands:
//! - `analyze`: run the analysis engines over a CSV bar file, print JSON
//! - `position-size`: size a fixed-risk position, print JSON
//! - `fetch`: download daily bars from Tiingo or Binance to CSV
//! - `config`: print the default engine configuration as TOML
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); stdout carries only results.

mod bars_file;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tradelens_core::data::{
    BarCache, BarProvider, BinanceProvider, CachedProvider, TiingoMarket, TiingoProvider,
};
use tradelens_core::risk::{size_position, Direction, PositionSizeRequest};
use tradelens_core::{AnalysisRequest, Analyzer, EngineConfig, Sections};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "tradelens",
    version,
    about = "TradeLens: technical analysis over daily OHLCV bars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a CSV bar file (date,open,high,low,close,volume).
    Analyze {
        /// Bar file for the analyzed symbol.
        #[arg(long)]
        bars: PathBuf,

        /// Symbol label. Defaults to the file name.
        #[arg(long)]
        symbol: Option<String>,

        /// Benchmark bar file; enables relative strength.
        #[arg(long)]
        benchmark: Option<PathBuf>,

        /// Benchmark label. Defaults to the benchmark file name.
        #[arg(long)]
        benchmark_symbol: Option<String>,

        /// Engine configuration TOML. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Comma-separated sections to produce. Defaults to every section the
        /// given inputs allow.
        #[arg(long, value_enum, value_delimiter = ',')]
        sections: Vec<Section>,

        #[command(flatten)]
        position: PositionArgs,

        /// Trade side for stop suggestions. Inferred from the stop when sizing.
        #[arg(long, value_enum)]
        direction: Option<Side>,

        /// Bars in the volume profile window.
        #[arg(long)]
        volume_lookback: Option<usize>,

        /// Bars scanned for chart patterns.
        #[arg(long)]
        pattern_lookback: Option<usize>,

        /// Single-line JSON instead of pretty-printed.
        #[arg(long, default_value_t = false)]
        compact: bool,
    },
    /// Size a fixed-risk position.
    PositionSize {
        #[command(flatten)]
        position: PositionArgs,

        /// Bar file whose last close stands in for a missing --price.
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Engine configuration TOML (risk section).
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Download daily bars.
    Fetch {
        /// Symbols to download (e.g., AAPL SPY, or btc eth for crypto).
        #[arg(required = true)]
        symbols: Vec<String>,

        #[arg(long, value_enum, default_value_t = ProviderKind::TiingoEquity)]
        provider: ProviderKind,

        /// Calendar days of history (Binance: daily candles, capped at 1000).
        #[arg(long, default_value_t = 365)]
        lookback_days: usize,

        /// Quote currency for crypto pairs.
        #[arg(long, default_value = "usd")]
        quote: String,

        /// Directory for `<SYMBOL>.csv` files. Prints CSV to stdout when omitted.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Print the default engine configuration as TOML.
    Config,
}

#[derive(clap::Args, Default)]
struct PositionArgs {
    /// Entry price. Defaults to the last close.
    #[arg(long)]
    price: Option<f64>,

    /// Stop-loss price.
    #[arg(long)]
    stop: Option<f64>,

    /// Dollars at risk.
    #[arg(long)]
    risk: Option<f64>,

    /// Account size in dollars.
    #[arg(long)]
    account: Option<f64>,
}

impl PositionArgs {
    /// `None` when no sizing flag is given; an error when only some are.
    fn to_request(&self) -> Result<Option<PositionSizeRequest>> {
        match (self.stop, self.risk, self.account) {
            (None, None, None) if self.price.is_none() => Ok(None),
            (Some(stop_price), Some(risk_amount), Some(account_size)) => {
                Ok(Some(PositionSizeRequest {
                    price: self.price,
                    stop_price,
                    risk_amount,
                    account_size,
                }))
            }
            _ => bail!("position sizing needs --stop, --risk and --account together"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Section {
    Indicators,
    VolumeProfile,
    Patterns,
    RelativeStrength,
    PositionSize,
    Stops,
}

fn sections_from(list: &[Section]) -> Sections {
    let mut sections = Sections::none();
    for s in list {
        match s {
            Section::Indicators => sections.indicators = true,
            Section::VolumeProfile => sections.volume_profile = true,
            Section::Patterns => sections.patterns = true,
            Section::RelativeStrength => sections.relative_strength = true,
            Section::PositionSize => sections.position_size = true,
            Section::Stops => sections.stop_suggestions = true,
        }
    }
    sections
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Side {
    Long,
    Short,
}

impl From<Side> for Direction {
    fn from(side: Side) -> Self {
        match side {
            Side::Long => Direction::Long,
            Side::Short => Direction::Short,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ProviderKind {
    TiingoEquity,
    TiingoCrypto,
    Binance,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            bars,
            symbol,
            benchmark,
            benchmark_symbol,
            config,
            sections,
            position,
            direction,
            volume_lookback,
            pattern_lookback,
            compact,
        } => run_analyze(AnalyzeArgs {
            bars,
            symbol,
            benchmark,
            benchmark_symbol,
            config,
            sections,
            position,
            direction,
            volume_lookback,
            pattern_lookback,
            compact,
        }),
        Commands::PositionSize {
            position,
            bars,
            config,
        } => run_position_size(&position, bars.as_deref(), config.as_deref()),
        Commands::Fetch {
            symbols,
            provider,
            lookback_days,
            quote,
            output_dir,
        } => run_fetch(&symbols, provider, lookback_days, &quote, output_dir.as_deref()),
        Commands::Config => {
            print!("{}", EngineConfig::default().to_toml().map_err(anyhow::Error::msg)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(p) => EngineConfig::from_file(p).map_err(anyhow::Error::msg)?,
        None => EngineConfig::default(),
    };
    Ok(config)
}

struct AnalyzeArgs {
    bars: PathBuf,
    symbol: Option<String>,
    benchmark: Option<PathBuf>,
    benchmark_symbol: Option<String>,
    config: Option<PathBuf>,
    sections: Vec<Section>,
    position: PositionArgs,
    direction: Option<Side>,
    volume_lookback: Option<usize>,
    pattern_lookback: Option<usize>,
    compact: bool,
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let analyzer = Analyzer::new(load_config(args.config.as_deref())?)?;
    let series = bars_file::load_bars(&args.bars, args.symbol.as_deref())?;
    let benchmark = args
        .benchmark
        .as_deref()
        .map(|p| bars_file::load_bars(p, args.benchmark_symbol.as_deref()))
        .transpose()?;

    let mut request = AnalysisRequest::new(&series);
    if let Some(b) = &benchmark {
        request = request.with_benchmark(b, b.symbol());
    }
    if let Some(position) = args.position.to_request()? {
        request = request.with_position(position);
    }
    if !args.sections.is_empty() {
        request = request.with_sections(sections_from(&args.sections));
    }
    if let Some(side) = args.direction {
        request = request.with_direction(side.into());
    }
    if let Some(days) = args.volume_lookback {
        request = request.with_volume_lookback(days);
    }
    if let Some(days) = args.pattern_lookback {
        request = request.with_pattern_lookback(days);
    }

    let result = analyzer
        .analyze(&request)
        .with_context(|| format!("analyze {}", series.symbol()))?;
    print_json(&result, args.compact)
}

fn run_position_size(
    position: &PositionArgs,
    bars: Option<&Path>,
    config: Option<&Path>,
) -> Result<()> {
    let Some(request) = position.to_request()? else {
        bail!("position sizing needs --stop, --risk and --account");
    };
    let last_close = match bars {
        Some(path) => bars_file::load_bars(path, None)?.last_close(),
        None => None,
    };
    let config = load_config(config)?;
    config.validate()?;
    let sized = size_position(&request, last_close, &config.risk)?;
    print_json(&sized, false)
}

fn run_fetch(
    symbols: &[String],
    provider: ProviderKind,
    lookback_days: usize,
    quote: &str,
    output_dir: Option<&Path>,
) -> Result<()> {
    if output_dir.is_none() && symbols.len() > 1 {
        bail!("--output-dir is required when fetching more than one symbol");
    }
    let cache = Arc::new(BarCache::default());
    match provider {
        ProviderKind::TiingoEquity | ProviderKind::TiingoCrypto => {
            let key = std::env::var("TIINGO_API_KEY")
                .context("TIINGO_API_KEY must be set for Tiingo downloads")?;
            let market = if provider == ProviderKind::TiingoCrypto {
                TiingoMarket::Crypto
            } else {
                TiingoMarket::Equity
            };
            let inner = TiingoProvider::new(key, market)?;
            fetch_all(&CachedProvider::new(inner, cache), symbols, lookback_days, quote, output_dir)
        }
        ProviderKind::Binance => {
            let inner = BinanceProvider::new()?;
            fetch_all(&CachedProvider::new(inner, cache), symbols, lookback_days, quote, output_dir)
        }
    }
}

fn fetch_all<P: BarProvider>(
    provider: &CachedProvider<P>,
    symbols: &[String],
    lookback_days: usize,
    quote: &str,
    output_dir: Option<&Path>,
) -> Result<()> {
    if let Some(dir) = output_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output directory {}", dir.display()))?;
    }

    let mut failures = 0;
    for symbol in symbols {
        let series = match provider.fetch_bars(symbol, lookback_days, quote) {
            Ok(series) => series,
            Err(e) => {
                tracing::error!(symbol = %symbol, error = %e, "fetch failed");
                failures += 1;
                continue;
            }
        };
        match output_dir {
            Some(dir) => {
                let path = dir.join(format!("{}.csv", series.symbol()));
                bars_file::save_bars(&series, &path)?;
                tracing::info!(path = %path.display(), bars = series.len(), "saved bars");
            }
            None => bars_file::write_bars(&series, std::io::stdout().lock())?,
        }
    }

    let status = provider.cache().status();
    tracing::debug!(entries = status.total_entries, "cache status");

    if failures > 0 {
        bail!("{failures} of {} symbol(s) failed", symbols.len());
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn partial_position_flags_are_rejected() {
        let args = PositionArgs {
            stop: Some(90.0),
            ..PositionArgs::default()
        };
        assert!(args.to_request().is_err());
        assert!(PositionArgs::default().to_request().unwrap().is_none());
    }

    #[test]
    fn full_position_flags_build_request() {
        let args = PositionArgs {
            price: None,
            stop: Some(90.0),
            risk: Some(1000.0),
            account: Some(100_000.0),
        };
        let req = args.to_request().unwrap().unwrap();
        assert_eq!(req.stop_price, 90.0);
        assert_eq!(req.price, None);
    }

    #[test]
    fn section_list_maps_to_flags() {
        let s = sections_from(&[Section::Indicators, Section::Stops]);
        assert!(s.indicators && s.stop_suggestions);
        assert!(!s.volume_profile && !s.patterns && !s.relative_strength && !s.position_size);
    }

    #[test]
    fn parses_analyze_arguments() {
        let cli = Cli::try_parse_from([
            "tradelens",
            "analyze",
            "--bars",
            "aapl.csv",
            "--sections",
            "indicators,volume-profile",
            "--stop",
            "90",
            "--risk",
            "1000",
            "--account",
            "100000",
            "--direction",
            "short",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                sections,
                position,
                direction,
                ..
            } => {
                assert_eq!(sections, vec![Section::Indicators, Section::VolumeProfile]);
                assert_eq!(position.stop, Some(90.0));
                assert_eq!(direction, Some(Side::Short));
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn analyze_end_to_end_from_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.csv");
        let mut csv = String::from("date,open,high,low,close,volume\n");
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        for i in 0..80 {
            let close = 100.0 + (i as f64 * 0.3).sin() * 5.0;
            let date = start + chrono::Duration::days(i);
            csv.push_str(&format!(
                "{date},{close},{},{},{close},1000\n",
                close + 1.0,
                close - 1.0
            ));
        }
        std::fs::write(&path, csv).unwrap();

        let series = bars_file::load_bars(&path, None).unwrap();
        let result = Analyzer::default()
            .analyze(&AnalysisRequest::new(&series))
            .unwrap();
        assert_eq!(result.symbol, "TEST");
        assert_eq!(result.bars, 80);
        assert!(result.volume_profile.is_some());
    }
}
