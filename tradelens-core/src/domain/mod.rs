//! Domain types shared by every engine.

pub mod align;
pub mod bar;
pub mod series;

pub use align::{align_closes, AlignedClose};
pub use bar::{Bar, BarError};
pub use series::BarSeries;
