//! Domain types shared by every analytics module.

pub mod bar;
pub mod series;
pub mod trade;

pub use bar::Bar;
pub use series::{PriceSeries, SeriesError};
pub use trade::{ExitReason, Trade};
