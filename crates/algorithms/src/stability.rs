//! Stability classification of majority classes
//!
//! Each observed cell falls in exactly one bucket, encoded as an offset on
//! its majority code:
//!
//! | variety v          | class    | value          |
//! |--------------------|----------|----------------|
//! | v == 1             | stable   | majority       |
//! | 1 < v <= cutoff    | dynamic  | majority + 100 |
//! | v > cutoff         | unstable | majority + 200 |
//! | no observations    | -        | NoData         |

use std::fmt;

use anthrome_core::{CategoryCode, Error, Grid, Result, CLASS_CODE_LIMIT, NODATA};
use serde::{Deserialize, Serialize};

use crate::algebra::{build_rows, combine, ensure_aligned};

/// Land-cover behaviour of a cell across the series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StabilityClass {
    Stable,
    Dynamic,
    Unstable,
}

impl StabilityClass {
    pub const ALL: [StabilityClass; 3] = [Self::Stable, Self::Dynamic, Self::Unstable];

    /// Value added to the majority code
    pub fn offset(self) -> CategoryCode {
        match self {
            Self::Stable => 0,
            Self::Dynamic => CLASS_CODE_LIMIT,
            Self::Unstable => 2 * CLASS_CODE_LIMIT,
        }
    }

    /// Bucket for a variety count; `None` for unobserved cells
    pub fn from_variety(variety: usize, cutoff: usize) -> Option<Self> {
        match variety {
            0 => None,
            1 => Some(Self::Stable),
            v if v <= cutoff => Some(Self::Dynamic),
            _ => Some(Self::Unstable),
        }
    }

    /// Split an output code into its class and base majority code
    pub fn decode(code: CategoryCode) -> Option<(Self, CategoryCode)> {
        if code == NODATA {
            return None;
        }
        let class = match code / CLASS_CODE_LIMIT {
            0 => Self::Stable,
            1 => Self::Dynamic,
            2 => Self::Unstable,
            _ => return None,
        };
        Some((class, code % CLASS_CODE_LIMIT))
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Dynamic => "dynamic",
            Self::Unstable => "unstable",
        }
    }
}

impl fmt::Display for StabilityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Largest variety still counted as dynamic: `floor(n / 2 + 0.5)` for a
/// series of `n` years.
pub fn stability_cutoff(series_len: usize) -> usize {
    (series_len + 1) / 2
}

/// One grid per stability class; data-bearing cells never overlap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StabilityGrids {
    pub stable: Grid,
    pub dynamic: Grid,
    pub unstable: Grid,
    pub cutoff: usize,
}

impl StabilityGrids {
    pub fn get(&self, class: StabilityClass) -> &Grid {
        match class {
            StabilityClass::Stable => &self.stable,
            StabilityClass::Dynamic => &self.dynamic,
            StabilityClass::Unstable => &self.unstable,
        }
    }

    /// Mosaic of the three class grids
    pub fn composite(&self) -> Result<Grid> {
        combine(&[&self.stable, &self.dynamic, &self.unstable])
    }
}

/// Split cells into stable, dynamic and unstable grids.
///
/// `majority` should already be backfilled. A cell whose majority is still
/// NoData (a tie with no latest observation) is NoData in every output.
///
/// # Errors
/// `InvalidParameter` for an empty series, `ShapeMismatch` for misaligned
/// grids and `CodeOutOfRange` if an observed majority code is 100 or more.
pub fn classify_stability(
    majority: &Grid,
    variety: &Grid,
    series_len: usize,
) -> Result<StabilityGrids> {
    if series_len == 0 {
        return Err(Error::InvalidParameter {
            name: "series_len",
            value: "0".into(),
            reason: "series must contain at least one year".into(),
        });
    }
    let (rows, cols) = ensure_aligned(&[majority, variety], "stability")?;

    if let Some(&code) = majority
        .data()
        .iter()
        .find(|&&code| code != NODATA && code >= CLASS_CODE_LIMIT)
    {
        return Err(Error::CodeOutOfRange {
            code,
            limit: CLASS_CODE_LIMIT,
        });
    }

    let cutoff = stability_cutoff(series_len);
    let class_grid = |class: StabilityClass| {
        build_rows(rows, cols, |row, out| {
            let majority_row = majority.data().row(row);
            let variety_row = variety.data().row(row);
            for (col, cell) in out.iter_mut().enumerate() {
                let m = majority_row[col];
                let v = variety_row[col];
                if m == NODATA || v == NODATA {
                    continue;
                }
                if StabilityClass::from_variety(v as usize, cutoff) == Some(class) {
                    *cell = m + class.offset();
                }
            }
        })
    };

    Ok(StabilityGrids {
        stable: class_grid(StabilityClass::Stable)?,
        dynamic: class_grid(StabilityClass::Dynamic)?,
        unstable: class_grid(StabilityClass::Unstable)?,
        cutoff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: u16 = NODATA;

    #[test]
    fn test_cutoff() {
        assert_eq!(stability_cutoff(1), 1);
        assert_eq!(stability_cutoff(2), 1);
        assert_eq!(stability_cutoff(3), 2);
        assert_eq!(stability_cutoff(10), 5);
        assert_eq!(stability_cutoff(11), 6);
    }

    #[test]
    fn test_cutoff_boundary_for_ten_years() {
        let majority = Grid::from_vec(vec![50, 50, 50], 1, 3).unwrap();
        let variety = Grid::from_vec(vec![1, 5, 6], 1, 3).unwrap();
        let grids = classify_stability(&majority, &variety, 10).unwrap();

        assert_eq!(grids.cutoff, 5);
        assert_eq!(grids.stable.to_vec(), vec![50, N, N]);
        assert_eq!(grids.dynamic.to_vec(), vec![N, 150, N]);
        assert_eq!(grids.unstable.to_vec(), vec![N, N, 250]);
        assert_eq!(grids.composite().unwrap().to_vec(), vec![50, 150, 250]);
    }

    #[test]
    fn test_unobserved_cells_are_nodata_everywhere() {
        let majority = Grid::from_vec(vec![N, N, 51], 1, 3).unwrap();
        let variety = Grid::from_vec(vec![N, 2, 1], 1, 3).unwrap();
        let grids = classify_stability(&majority, &variety, 3).unwrap();

        for class in StabilityClass::ALL {
            assert_eq!(grids.get(class).get(0, 0).unwrap(), N);
            assert_eq!(grids.get(class).get(0, 1).unwrap(), N);
        }
        assert_eq!(grids.composite().unwrap().to_vec(), vec![N, N, 51]);
    }

    #[test]
    fn test_classes_are_exclusive() {
        let majority = Grid::from_vec(vec![50, 51, 43, 41, 42, 50], 2, 3).unwrap();
        let variety = Grid::from_vec(vec![1, 2, 3, 4, 5, N], 2, 3).unwrap();
        let grids = classify_stability(&majority, &variety, 5).unwrap();

        for row in 0..2 {
            for col in 0..3 {
                let hits = StabilityClass::ALL
                    .iter()
                    .filter(|&&c| !grids.get(c).is_nodata_at(row, col).unwrap())
                    .count();
                let observed = !variety.is_nodata_at(row, col).unwrap();
                assert_eq!(hits, usize::from(observed));
            }
        }
    }

    #[test]
    fn test_rejects_codes_that_collide_with_offsets() {
        let majority = Grid::from_vec(vec![150], 1, 1).unwrap();
        let variety = Grid::from_vec(vec![1], 1, 1).unwrap();
        assert!(matches!(
            classify_stability(&majority, &variety, 3),
            Err(Error::CodeOutOfRange { code: 150, .. })
        ));
    }

    #[test]
    fn test_decode() {
        assert_eq!(StabilityClass::decode(50), Some((StabilityClass::Stable, 50)));
        assert_eq!(StabilityClass::decode(151), Some((StabilityClass::Dynamic, 51)));
        assert_eq!(StabilityClass::decode(243), Some((StabilityClass::Unstable, 43)));
        assert_eq!(StabilityClass::decode(N), None);
        assert_eq!(StabilityClass::decode(300), None);
    }
}
