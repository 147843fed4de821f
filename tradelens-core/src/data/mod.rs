//! Market data: providers, normalization and caching.

pub mod binance;
pub mod cache;
pub mod cached;
pub mod provider;
pub mod tiingo;

pub use binance::BinanceProvider;
pub use cache::{BarCache, CacheKey, CacheStatus, DEFAULT_TTL};
pub use cached::CachedProvider;
pub use provider::{normalize_bars, BarProvider, DataError};
pub use tiingo::{TiingoMarket, TiingoProvider};
