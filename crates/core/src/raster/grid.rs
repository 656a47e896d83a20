//! Categorical grid type

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use ndarray::Array2;

/// Integer land-cover class stored in a [`Grid`] cell.
pub type CategoryCode = u16;

/// Sentinel marking a cell without a valid observation.
///
/// Disjoint from every class code and from the stability offset bands.
pub const NODATA: CategoryCode = CategoryCode::MAX;

/// Exclusive upper bound for base class codes; the stability offsets
/// (+100, +200) are only unambiguous below it.
pub const CLASS_CODE_LIMIT: CategoryCode = 100;

/// A dense 2D grid of category codes.
///
/// Grids are immutable values: every operation in the algebra produces a
/// freshly owned grid and only borrows its inputs. Absent observations are
/// stored as [`NODATA`].
///
/// # Example
///
/// ```ignore
/// use anthrome_core::{Grid, NODATA};
///
/// let grid = Grid::from_vec(vec![50, NODATA, 51, 50], 2, 2)?;
/// assert!(grid.is_nodata_at(0, 1)?);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    /// Cell values in row-major order (row, col)
    data: Array2<CategoryCode>,
}

impl Grid {
    /// Create a grid where every cell is NoData
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, NODATA)
    }

    /// Create a grid filled with a single value
    pub fn filled(rows: usize, cols: usize, value: CategoryCode) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
        }
    }

    /// Create a grid from row-major data
    pub fn from_vec(data: Vec<CategoryCode>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions { rows, cols });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self { data: array })
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid has no cells
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fail with [`Error::ShapeMismatch`] unless `other` has the same shape.
    pub fn ensure_same_shape(&self, other: &Grid) -> Result<()> {
        let (er, ec) = self.shape();
        let (ar, ac) = other.shape();
        if (er, ec) != (ar, ac) {
            return Err(Error::ShapeMismatch { er, ec, ar, ac });
        }
        Ok(())
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<CategoryCode> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Check if cell at (row, col) holds NoData
    pub fn is_nodata_at(&self, row: usize, col: usize) -> Result<bool> {
        Ok(self.get(row, col)? == NODATA)
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<CategoryCode> {
        &self.data
    }

    /// Row-major copy of the cell values
    pub fn to_vec(&self) -> Vec<CategoryCode> {
        self.data.iter().copied().collect()
    }

    // Statistics

    /// Number of cells holding each non-NoData code, in ascending code order
    pub fn class_counts(&self) -> BTreeMap<CategoryCode, usize> {
        let mut counts = BTreeMap::new();
        for &value in self.data.iter().filter(|&&v| v != NODATA) {
            *counts.entry(value).or_insert(0) += 1;
        }
        counts
    }

    /// Number of cells holding a valid code
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&v| v != NODATA).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid = Grid::empty(100, 200);
        assert_eq!(grid.rows(), 100);
        assert_eq!(grid.cols(), 200);
        assert_eq!(grid.shape(), (100, 200));
        assert_eq!(grid.valid_count(), 0);
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        let err = Grid::from_vec(vec![1, 2, 3], 2, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { rows: 2, cols: 2 }));
    }

    #[test]
    fn test_grid_access() {
        let grid = Grid::from_vec(vec![50, NODATA, 51, 52], 2, 2).unwrap();
        assert_eq!(grid.get(1, 0).unwrap(), 51);
        assert!(grid.is_nodata_at(0, 1).unwrap());
        assert!(!grid.is_nodata_at(1, 1).unwrap());
        assert!(matches!(
            grid.get(2, 0),
            Err(Error::IndexOutOfBounds { row: 2, .. })
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = Grid::empty(3, 4);
        let b = Grid::empty(4, 3);
        assert!(a.ensure_same_shape(&a.clone()).is_ok());
        assert!(matches!(
            a.ensure_same_shape(&b),
            Err(Error::ShapeMismatch { er: 3, ec: 4, ar: 4, ac: 3 })
        ));
    }

    #[test]
    fn test_class_counts() {
        let grid = Grid::from_vec(vec![51, 50, NODATA, 50, 150, 50], 2, 3).unwrap();
        let counts: Vec<_> = grid.class_counts().into_iter().collect();
        assert_eq!(counts, vec![(50, 3), (51, 1), (150, 1)]);
        assert_eq!(grid.valid_count(), 5);
    }
}
