//! Property tests for the cell-wise combinators.

use anthrome_algorithms::algebra::{combine, reclassify};
use anthrome_core::{Grid, NODATA};
use proptest::prelude::*;
use proptest::test_runner::{Config as PropConfig, RngAlgorithm, TestRng, TestRunner};

const ROWS: usize = 4;
const COLS: usize = 5;

/// Seeded runner so failures reproduce across machines.
fn runner() -> TestRunner {
    const SEED_BYTES: [u8; 32] = [
        0x50, 0x51, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0,
    ];
    let rng = TestRng::from_seed(RngAlgorithm::ChaCha, &SEED_BYTES);
    TestRunner::new_with_rng(PropConfig::default(), rng)
}

/// A layer whose cells are NoData about half the time.
fn layer() -> impl Strategy<Value = Vec<u16>> {
    prop::collection::vec(prop_oneof![Just(NODATA), 0u16..100], ROWS * COLS)
}

#[test]
fn combine_respects_precedence() {
    runner()
        .run(&(layer(), layer(), layer()), |(a, b, c)| {
            let ga = Grid::from_vec(a.clone(), ROWS, COLS).unwrap();
            let gb = Grid::from_vec(b.clone(), ROWS, COLS).unwrap();
            let gc = Grid::from_vec(c.clone(), ROWS, COLS).unwrap();

            let out = combine(&[&ga, &gb, &gc]).unwrap().to_vec();
            for i in 0..ROWS * COLS {
                let expected = [a[i], b[i], c[i]]
                    .into_iter()
                    .find(|&v| v != NODATA)
                    .unwrap_or(NODATA);
                prop_assert_eq!(out[i], expected);
            }
            Ok(())
        })
        .unwrap();
}

#[test]
fn reclassify_marks_any_presence() {
    runner()
        .run(&(layer(), layer()), |(a, b)| {
            let ga = Grid::from_vec(a.clone(), ROWS, COLS).unwrap();
            let gb = Grid::from_vec(b.clone(), ROWS, COLS).unwrap();

            let out = reclassify(&[&ga, &gb], 51).unwrap().to_vec();
            for i in 0..ROWS * COLS {
                let present = a[i] != NODATA || b[i] != NODATA;
                prop_assert_eq!(out[i], if present { 51 } else { NODATA });
            }
            Ok(())
        })
        .unwrap();
}
