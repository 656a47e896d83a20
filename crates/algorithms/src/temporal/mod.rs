//! Multi-year aggregation of annual classification grids
//!
//! - `RasterSeries`: aligned grids ordered by descending year
//! - `aggregate`: per-cell majority and variety
//! - `backfill`: fill majority ties from the most recent year

mod aggregate;
mod backfill;
mod series;

pub use aggregate::{aggregate, CellStatistics};
pub use backfill::backfill;
pub use series::{RasterSeries, Year};
