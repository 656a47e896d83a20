//! Priority mosaic of categorical layers

use anthrome_core::{Grid, Result, NODATA};

use super::{build_rows, ensure_aligned};

/// Merge layers by precedence: each cell takes the value of the first layer
/// (in slice order) that has data there, or NoData if none does.
///
/// Callers encode overlap resolution in the order, e.g.
/// `[agriculture, forest, water/other, urban, range]`.
///
/// # Errors
/// `ShapeMismatch` if the layers differ in shape, `InvalidParameter` if
/// `layers` is empty.
pub fn combine(layers: &[&Grid]) -> Result<Grid> {
    let (rows, cols) = ensure_aligned(layers, "layers")?;

    build_rows(rows, cols, |row, out| {
        let views: Vec<_> = layers.iter().map(|grid| grid.data().row(row)).collect();
        for (col, cell) in out.iter_mut().enumerate() {
            if let Some(value) = views.iter().map(|v| v[col]).find(|&v| v != NODATA) {
                *cell = value;
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anthrome_core::Error;

    const N: u16 = NODATA;

    #[test]
    fn test_first_layer_wins() {
        let a = Grid::from_vec(vec![1, N, N, N], 2, 2).unwrap();
        let b = Grid::from_vec(vec![2, 2, N, N], 2, 2).unwrap();
        let c = Grid::from_vec(vec![3, 3, 3, N], 2, 2).unwrap();

        let out = combine(&[&a, &b, &c]).unwrap();
        assert_eq!(out.to_vec(), vec![1, 2, 3, N]);

        let reversed = combine(&[&c, &b, &a]).unwrap();
        assert_eq!(reversed.to_vec(), vec![3, 3, 3, N]);
    }

    #[test]
    fn test_single_layer_is_identity() {
        let a = Grid::from_vec(vec![7, N, 9, 50, N, 51], 2, 3).unwrap();
        assert_eq!(combine(&[&a]).unwrap(), a);
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Grid::empty(2, 2);
        let b = Grid::empty(2, 3);
        assert!(matches!(
            combine(&[&a, &b]),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_layer_list() {
        assert!(matches!(
            combine(&[]),
            Err(Error::InvalidParameter { name: "layers", .. })
        ));
    }
}
