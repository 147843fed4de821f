//! Risk Engine: position sizing and stop-loss suggestions.
//!
//! Sizing turns a risk budget and a stop distance into a share count.
//! Stop suggestions are independent of sizing: they gather ATR, percentage,
//! swing-pivot and moving-average levels and rank them by distance, leaving
//! the choice to the caller.

pub mod position_size;
pub mod stops;

pub use position_size::{size_position, Direction, PositionSize, PositionSizeRequest, ProfitTarget};
pub use stops::{suggest_stops, StopKind, StopSuggestion};
