//! Property-based tests for the grid model.
//!
//! Random tile geometries and seeds are checked against the plain-array
//! reference model.

mod common;

use common::{device, GameOfLife};
use proptest::prelude::*;
use silife_core::Grid;

/// (tile_w, tile_h, tiles_x, tiles_y, rows)
fn grid_and_rows() -> impl Strategy<Value = (usize, usize, usize, usize, Vec<u64>)> {
    (1usize..=5, 1usize..=5, 1usize..=3, 1usize..=3).prop_flat_map(|(tw, th, tx, ty)| {
        let mask = (1u64 << (tw * tx)) - 1;
        let rows = prop::collection::vec(any::<u64>().prop_map(move |r| r & mask), th * ty);
        (Just(tw), Just(th), Just(tx), Just(ty), rows)
    })
}

fn load(tw: usize, th: usize, tx: usize, ty: usize, rows: &[u64]) -> Grid {
    let mut grid = Grid::new(tw, th, tx, ty);
    for (r, &bits) in rows.iter().enumerate() {
        grid.write_row(r, bits);
    }
    grid
}

proptest! {
    /// Tiled stepping equals whole-grid stepping, with and without wrap
    #[test]
    fn prop_matches_reference((tw, th, tx, ty, rows) in grid_and_rows(), wrap in any::<bool>(), steps in 1usize..6) {
        let mut grid = load(tw, th, tx, ty, &rows);
        let mut life = GameOfLife::from_rows(&rows, tw * tx, wrap);
        for _ in 0..steps {
            grid.step(wrap);
            life.step();
            prop_assert_eq!(grid.dump(), life.dump());
        }
    }

    /// Same seed and inputs give the same trace
    #[test]
    fn prop_deterministic((tw, th, tx, ty, rows) in grid_and_rows(), wrap in any::<bool>()) {
        let mut a = load(tw, th, tx, ty, &rows);
        let mut b = load(tw, th, tx, ty, &rows);
        for _ in 0..4 {
            a.step(wrap);
            b.step(wrap);
        }
        prop_assert_eq!(a.rows(), b.rows());
    }

    /// Wrap only changes the next state of perimeter cells
    #[test]
    fn prop_wrap_is_local((tw, th, tx, ty, rows) in grid_and_rows()) {
        let mut wrapped = load(tw, th, tx, ty, &rows);
        let mut bounded = load(tw, th, tx, ty, &rows);
        wrapped.step(true);
        bounded.step(false);
        for r in 0..wrapped.height() {
            for c in 0..wrapped.width() {
                if !wrapped.is_perimeter(r, c) {
                    prop_assert_eq!(wrapped.get(r, c), bounded.get(r, c), "cell ({}, {})", r, c);
                }
            }
        }
    }

    /// Port 1 and port 2 return what port 1 wrote
    #[test]
    fn prop_row_round_trip(row in 0usize..32, value in any::<u32>()) {
        let mut dev = device(8, 8, 4, 4);
        dev.write(dev.map.grid_row(row), value);
        prop_assert_eq!(dev.read(dev.map.grid_row(row)), value);
        prop_assert_eq!(dev.read(dev.map.grid2_row(row)), value);
        prop_assert_eq!(dev.grid.population(), value.count_ones() as usize);
    }
}
