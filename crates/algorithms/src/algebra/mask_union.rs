//! Union of presence masks into a single class

use anthrome_core::{CategoryCode, Error, Grid, Result, NODATA};

use super::{build_rows, ensure_aligned};

/// Reclassify the union of several masks to one code.
///
/// A cell gets `output_code` when at least one mask has data there and stays
/// NoData otherwise. Mask values themselves are ignored.
///
/// # Example
/// ```ignore
/// let agriculture = reclassify(&[&dryland, &irrigated, &orchard], 50)?;
/// ```
pub fn reclassify(masks: &[&Grid], output_code: CategoryCode) -> Result<Grid> {
    if output_code == NODATA {
        return Err(Error::InvalidParameter {
            name: "output_code",
            value: output_code.to_string(),
            reason: "output code collides with the NoData sentinel".into(),
        });
    }
    let (rows, cols) = ensure_aligned(masks, "masks")?;

    build_rows(rows, cols, |row, out| {
        let views: Vec<_> = masks.iter().map(|grid| grid.data().row(row)).collect();
        for (col, cell) in out.iter_mut().enumerate() {
            if views.iter().any(|v| v[col] != NODATA) {
                *cell = output_code;
            }
        }
    })
}
