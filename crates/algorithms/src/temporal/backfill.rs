//! Majority tie resolution

use anthrome_core::{Grid, Result, NODATA};

use crate::algebra::{build_rows, ensure_aligned};

/// Replace NoData majority cells with the most recent year's value.
///
/// Ties are not re-broken among the tied codes; the latest observation is
/// taken as is, even when it is NoData itself.
pub fn backfill(majority: &Grid, most_recent: &Grid) -> Result<Grid> {
    let (rows, cols) = ensure_aligned(&[majority, most_recent], "backfill")?;

    build_rows(rows, cols, |row, out| {
        let majority_row = majority.data().row(row);
        let recent_row = most_recent.data().row(row);
        for (col, cell) in out.iter_mut().enumerate() {
            let m = majority_row[col];
            *cell = if m == NODATA { recent_row[col] } else { m };
        }
    })
}
