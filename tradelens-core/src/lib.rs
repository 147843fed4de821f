//! TradeLens Core: technical analysis over daily OHLCV bars.
//!
//! The crate is organised as independent engines that read a [`BarSeries`]
//! and never mutate it:
//! - Indicator engine (SMA, EMA, RSI, MACD, ATR, ADRP, volume SMA, trend status)
//! - Volume profile (price bins, point of control, value area)
//! - Pattern engine (swing pivots, double tops/bottoms, head and shoulders, triangles)
//! - Relative strength against a benchmark series
//! - Risk engine (position sizing, stop suggestions)
//!
//! [`Analyzer`] runs the requested engines over one series. The `data` module
//! supplies bars from remote providers behind the [`BarProvider`] trait.

pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod patterns;
pub mod relative_strength;
pub mod risk;
pub mod volume_profile;

pub use analysis::{AnalysisRequest, AnalysisResult, Analyzer, Sections};
pub use config::EngineConfig;
pub use data::{BarProvider, DataError};
pub use domain::{Bar, BarError, BarSeries};
pub use error::{AnalysisError, Result};
