//! Date alignment between a symbol and its benchmark.
//!
//! Only dates present in both series survive (inner join). Nothing is
//! forward-filled.

use super::series::BarSeries;
use chrono::NaiveDate;
use std::cmp::Ordering;

/// Closing prices of a symbol and its benchmark on a shared date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedClose {
    pub date: NaiveDate,
    pub symbol: f64,
    pub benchmark: f64,
}

/// Inner-join two series on date, oldest first.
///
/// Both inputs are already strictly date-ordered, so a single merge walk
/// suffices.
pub fn align_closes(symbol: &BarSeries, benchmark: &BarSeries) -> Vec<AlignedClose> {
    let a = symbol.bars();
    let b = benchmark.bars();
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].date.cmp(&b[j].date) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(AlignedClose {
                    date: a[i].date,
                    symbol: a[i].close,
                    benchmark: b[j].close,
                });
                i += 1;
                j += 1;
            }
        }
    }

    out
}
