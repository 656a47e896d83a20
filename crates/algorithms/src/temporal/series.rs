//! Ordered multi-year grid series

use anthrome_core::{Error, Grid, Result};

/// Calendar year of an observation
pub type Year = i32;

/// Borrowed grids, one per year, most recent first.
///
/// Construction checks that years are strictly descending and that every
/// grid has the same shape. Aggregation does not depend on the order; only
/// [`most_recent`](Self::most_recent) does.
#[derive(Debug, Clone)]
pub struct RasterSeries<'a> {
    years: Vec<Year>,
    grids: Vec<&'a Grid>,
}

impl<'a> RasterSeries<'a> {
    pub fn new(entries: impl IntoIterator<Item = (Year, &'a Grid)>) -> Result<Self> {
        let (years, grids): (Vec<Year>, Vec<&'a Grid>) = entries.into_iter().unzip();

        let Some(first) = grids.first() else {
            return Err(Error::InvalidParameter {
                name: "series",
                value: "[]".into(),
                reason: "a series needs at least one year".into(),
            });
        };
        if let Some(pair) = years.windows(2).find(|pair| pair[0] <= pair[1]) {
            return Err(Error::InvalidParameter {
                name: "years",
                value: format!("{:?}", years),
                reason: format!("years must be strictly descending ({} then {})", pair[0], pair[1]),
            });
        }
        for grid in &grids[1..] {
            first.ensure_same_shape(grid)?;
        }

        Ok(Self { years, grids })
    }

    /// Number of years
    pub fn len(&self) -> usize {
        self.grids.len()
    }

    /// Always false; an empty series cannot be constructed
    pub fn is_empty(&self) -> bool {
        self.grids.is_empty()
    }

    pub fn years(&self) -> &[Year] {
        &self.years
    }

    pub fn grids(&self) -> &[&'a Grid] {
        &self.grids
    }

    /// Shape shared by every grid
    pub fn shape(&self) -> (usize, usize) {
        self.grids[0].shape()
    }

    /// Latest year and its grid
    pub fn most_recent(&self) -> (Year, &'a Grid) {
        (self.years[0], self.grids[0])
    }
}
