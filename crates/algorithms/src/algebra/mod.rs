//! Cell-wise algebra over aligned categorical grids
//!
//! - Priority mosaic: first non-NoData layer wins
//! - Mask union: presence in any mask maps to one output code

mod mask_union;
mod mosaic;

pub use mask_union::reclassify;
pub use mosaic::combine;

use crate::maybe_rayon::*;
use anthrome_core::{CategoryCode, Error, Grid, Result, NODATA};

/// Validate that every grid shares one shape and return it.
///
/// Runs once per operation; the per-cell loops rely on it.
pub(crate) fn ensure_aligned(grids: &[&Grid], what: &'static str) -> Result<(usize, usize)> {
    let (first, rest) = grids.split_first().ok_or_else(|| Error::InvalidParameter {
        name: what,
        value: "[]".into(),
        reason: "at least one grid is required".into(),
    })?;
    for grid in rest {
        first.ensure_same_shape(grid)?;
    }
    Ok(first.shape())
}

/// Build a grid row by row; `fill` receives the row index and a row buffer
/// pre-set to NoData. Rows are independent, so they run on the worker pool.
pub(crate) fn build_rows<F>(rows: usize, cols: usize, fill: F) -> Result<Grid>
where
    F: Fn(usize, &mut [CategoryCode]) + Sync + Send,
{
    let data: Vec<CategoryCode> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![NODATA; cols];
            fill(row, &mut row_data);
            row_data
        })
        .collect();

    Grid::from_vec(data, rows, cols)
}
