//! Grid engine: the birth/survival rule on a toroidal grid.
//!
//! Everything here is a pure function of its inputs. Neighbour lookups
//! wrap modulo the grid dimensions, so the left edge borders the right
//! edge and the top edge borders the bottom edge.
//!
//! # Rule
//!
//! - A live cell with 2 or 3 live neighbours survives.
//! - A dead cell with exactly 3 live neighbours is born.
//! - Every other cell is dead in the next generation.

use chrono::Utc;
use life_types::Grid;

/// LCG multiplier (Knuth's MMIX constant).
const LCG_MULTIPLIER: u64 = 6_364_136_223_846_793_005;

/// LCG increment.
const LCG_INCREMENT: u64 = 1_442_695_040_888_963_407;

/// Keeps the generator state within 63 bits.
const LCG_MASK: u64 = 0x7fff_ffff_ffff_ffff;

/// Relative offsets of the eight neighbours, as `(dx, dy)`.
const NEIGHBOUR_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Linear congruential generator used to seed random grids.
///
/// Not cryptographic. A given seed reproduces the same sequence, which
/// is all random layouts need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lcg {
    state: u64,
}

impl Lcg {
    /// Create a generator from an explicit seed.
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Create a generator seeded from the wall clock in nanoseconds.
    pub fn from_time() -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self::new(u64::try_from(nanos).unwrap_or_default())
    }

    /// Advance the generator and return the new state.
    pub const fn next_state(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_INCREMENT)
            & LCG_MASK;
        self.state
    }
}

/// Return an all-dead grid of `width` columns and `height` rows.
pub fn make_grid(width: usize, height: usize) -> Grid {
    Grid::new(width, height)
}

/// Return a grid where roughly one cell in three is alive, seeded from
/// the current time.
///
/// Two calls within the same nanosecond produce the same layout.
pub fn random_grid(width: usize, height: usize) -> Grid {
    fill_random(width, height, Lcg::from_time())
}

/// Like [`random_grid`] with an explicit seed.
pub fn random_grid_with_seed(width: usize, height: usize, seed: u64) -> Grid {
    fill_random(width, height, Lcg::new(seed))
}

fn fill_random(width: usize, height: usize, mut rng: Lcg) -> Grid {
    // One draw per cell, row-major.
    Grid::from_fn(width, height, |_, _| rng.next_state().checked_rem(3) == Some(0))
}

/// Count the live neighbours of column `x`, row `y`, wrapping at the
/// edges.
///
/// Returns a value in `0..=8`. On grids narrower or shorter than three
/// cells the wrapped offsets revisit the same cells, and each visit
/// counts.
pub fn count_neighbors(grid: &Grid, x: usize, y: usize) -> u8 {
    let (width, height) = (grid.width(), grid.height());
    NEIGHBOUR_OFFSETS
        .iter()
        .filter(|&&(dx, dy)| grid.is_alive(wrap(x, dx, width), wrap(y, dy, height)))
        .fold(0_u8, |count, _| count.saturating_add(1))
}

/// Compute the next generation.
///
/// Reads only from `grid` and writes only to the returned grid, so each
/// cell sees its neighbours as they were at the start of the generation.
pub fn next_generation(grid: &Grid) -> Grid {
    Grid::from_fn(grid.width(), grid.height(), |x, y| {
        next_cell(grid.is_alive(x, y), count_neighbors(grid, x, y))
    })
}

/// Apply the birth/survival rule to one cell.
pub const fn next_cell(alive: bool, neighbours: u8) -> bool {
    matches!((alive, neighbours), (true, 2 | 3) | (false, 3))
}

/// Shift `coord` by `delta` in `-1..=1`, wrapping within `0..len`.
const fn wrap(coord: usize, delta: i8, len: usize) -> usize {
    match delta {
        -1 if coord == 0 => len.saturating_sub(1),
        -1 => coord.saturating_sub(1),
        1 if coord.saturating_add(1) >= len => 0,
        1 => coord.saturating_add(1),
        _ => coord,
    }
}
