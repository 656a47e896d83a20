//! Per-cell majority and variety over a series

use crate::maybe_rayon::*;
use anthrome_core::{CategoryCode, Error, Grid, Result, NODATA};

use super::RasterSeries;

/// Cell statistics over a whole series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellStatistics {
    /// Most frequent observed code; NoData where the top count is tied or
    /// the cell was never observed
    pub majority: Grid,
    /// Number of distinct observed codes; NoData where the cell was never
    /// observed (a variety of zero)
    pub variety: Grid,
}

impl CellStatistics {
    /// Variety as a count, with unobserved cells reported as 0
    pub fn variety_at(&self, row: usize, col: usize) -> Result<usize> {
        let v = self.variety.get(row, col)?;
        Ok(if v == NODATA { 0 } else { v as usize })
    }
}

/// Compute majority and variety for every cell of `series`.
///
/// NoData observations are skipped. When two or more codes share the
/// highest count the majority is NoData; resolving it is left to
/// [`backfill`](super::backfill). Tallies are kept in first-seen order, so
/// the result never depends on hash iteration order.
pub fn aggregate(series: &RasterSeries<'_>) -> Result<CellStatistics> {
    let (rows, cols) = series.shape();
    let n = series.len();
    if n >= NODATA as usize {
        return Err(Error::InvalidParameter {
            name: "series",
            value: n.to_string(),
            reason: "too many years to count in a grid cell".into(),
        });
    }
    let grids = series.grids();

    let (majority, variety): (Vec<CategoryCode>, Vec<CategoryCode>) = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let views: Vec<_> = grids.iter().map(|grid| grid.data().row(row)).collect();
            let mut tally: Vec<(CategoryCode, usize)> = Vec::with_capacity(n);
            let mut out = Vec::with_capacity(cols);

            for col in 0..cols {
                tally.clear();
                for value in views.iter().map(|v| v[col]).filter(|&v| v != NODATA) {
                    match tally.iter_mut().find(|(code, _)| *code == value) {
                        Some((_, count)) => *count += 1,
                        None => tally.push((value, 1)),
                    }
                }
                out.push(cell_statistics(&tally));
            }
            out
        })
        .unzip();

    Ok(CellStatistics {
        majority: Grid::from_vec(majority, rows, cols)?,
        variety: Grid::from_vec(variety, rows, cols)?,
    })
}

/// (majority, variety) of one cell's tally
fn cell_statistics(tally: &[(CategoryCode, usize)]) -> (CategoryCode, CategoryCode) {
    if tally.is_empty() {
        return (NODATA, NODATA);
    }
    let top = tally.iter().map(|&(_, count)| count).max().unwrap_or(0);
    let mut leaders = tally.iter().filter(|&&(_, count)| count == top);
    let majority = match (leaders.next(), leaders.next()) {
        (Some(&(code, _)), None) => code,
        _ => NODATA,
    };
    (majority, tally.len() as CategoryCode)
}

#[cfg(test)]
mod tests {
    use super::*;

    const N: u16 = NODATA;

    /// 4 cells (1x4) over 3 years, most recent first.
    fn series_grids() -> [Grid; 3] {
        [
            Grid::from_vec(vec![7, 9, N, 3], 1, 4).unwrap(),
            Grid::from_vec(vec![7, N, N, 3], 1, 4).unwrap(),
            Grid::from_vec(vec![9, 7, N, 3], 1, 4).unwrap(),
        ]
    }

    #[test]
    fn test_majority_and_variety() {
        let [a, b, c] = series_grids();
        let series = RasterSeries::new([(2016, &a), (2015, &b), (2014, &c)]).unwrap();
        let stats = aggregate(&series).unwrap();

        // [7,7,9] -> 7 with 2 distinct values
        assert_eq!(stats.majority.get(0, 0).unwrap(), 7);
        assert_eq!(stats.variety_at(0, 0).unwrap(), 2);

        // [9,7] -> tie
        assert_eq!(stats.majority.get(0, 1).unwrap(), N);
        assert_eq!(stats.variety_at(0, 1).unwrap(), 2);

        // never observed
        assert_eq!(stats.majority.get(0, 2).unwrap(), N);
        assert_eq!(stats.variety.get(0, 2).unwrap(), N);
        assert_eq!(stats.variety_at(0, 2).unwrap(), 0);

        // [3,3,3]
        assert_eq!(stats.majority.get(0, 3).unwrap(), 3);
        assert_eq!(stats.variety_at(0, 3).unwrap(), 1);
    }

    #[test]
    fn test_identical_series_has_variety_one() {
        let grids: Vec<Grid> = (0..5).map(|_| Grid::filled(2, 2, 3)).collect();
        let series = RasterSeries::new((0..5).map(|i| (2016 - i, &grids[i as usize]))).unwrap();
        let stats = aggregate(&series).unwrap();
        assert_eq!(stats.majority.to_vec(), vec![3; 4]);
        assert_eq!(stats.variety.to_vec(), vec![1; 4]);
    }

    #[test]
    fn test_three_way_tie() {
        let a = Grid::filled(1, 1, 1);
        let b = Grid::filled(1, 1, 2);
        let c = Grid::filled(1, 1, 3);
        let series = RasterSeries::new([(2016, &a), (2015, &b), (2014, &c)]).unwrap();
        let stats = aggregate(&series).unwrap();
        assert_eq!(stats.majority.get(0, 0).unwrap(), N);
        assert_eq!(stats.variety.get(0, 0).unwrap(), 3);
    }

    #[test]
    fn test_order_independent() {
        let [a, b, c] = series_grids();
        let forward = RasterSeries::new([(2016, &a), (2015, &b), (2014, &c)]).unwrap();
        let shuffled = RasterSeries::new([(2016, &c), (2015, &a), (2014, &b)]).unwrap();
        assert_eq!(aggregate(&forward).unwrap(), aggregate(&shuffled).unwrap());
    }
}
