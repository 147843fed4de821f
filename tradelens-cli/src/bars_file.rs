//! CSV bar files: `date,open,high,low,close,volume` with a header row.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tradelens_core::data::normalize_bars;
use tradelens_core::{Bar, BarSeries};

/// Symbol implied by a file name, e.g. `data/aapl.csv` -> `AAPL`.
pub fn symbol_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

/// Load a bar file. Rows may be in any order; repeated dates keep the first row.
pub fn load_bars(path: &Path, symbol: Option<&str>) -> Result<BarSeries> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("open bar file {}", path.display()))?;

    let mut bars = Vec::new();
    for (i, row) in reader.deserialize::<Bar>().enumerate() {
        // +2: one-based, after the header
        let bar = row.with_context(|| format!("{}: row {}", path.display(), i + 2))?;
        bars.push(bar);
    }

    let symbol = symbol
        .map(str::to_uppercase)
        .unwrap_or_else(|| symbol_from_path(path));
    let series = normalize_bars(&symbol, bars)
        .with_context(|| format!("invalid bars in {}", path.display()))?;
    tracing::debug!(path = %path.display(), symbol = %symbol, bars = series.len(), "loaded bar file");
    Ok(series)
}

/// Write bars as CSV to any writer.
pub fn write_bars<W: Write>(series: &BarSeries, out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for bar in series.bars() {
        writer.serialize(bar)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn save_bars(series: &BarSeries, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("create bar file {}", path.display()))?;
    write_bars(series, file)
}
