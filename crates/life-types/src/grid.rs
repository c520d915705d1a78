//! The cell matrix shared by the engine and its observers.
//!
//! A [`Grid`] is a rectangular matrix of booleans stored row-major:
//! `rows[y][x] == true` means the cell in column `x`, row `y` is alive.
//! It serializes as a bare `bool[height][width]` array so the
//! presentation layer can index it directly.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Rectangular boolean cell matrix.
///
/// Every row has the same length. Constructors in this module uphold
/// that invariant; a grid deserialized from foreign input is only as
/// rectangular as its source, but every accessor bounds-checks, so a
/// ragged grid never panics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Grid(Vec<Vec<bool>>);

impl Grid {
    /// Create an all-dead grid of `width` columns and `height` rows.
    pub fn new(width: usize, height: usize) -> Self {
        Self(vec![vec![false; width]; height])
    }

    /// Build a grid by evaluating `alive(x, y)` for every cell.
    ///
    /// Cells are visited row by row, left to right, which lets callers
    /// drive a sequential generator from the closure.
    pub fn from_fn(width: usize, height: usize, mut alive: impl FnMut(usize, usize) -> bool) -> Self {
        Self(
            (0..height)
                .map(|y| (0..width).map(|x| alive(x, y)).collect())
                .collect(),
        )
    }

    /// Wrap existing rows. Returns `None` if the rows differ in length.
    pub fn from_rows(rows: Vec<Vec<bool>>) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        rows.iter()
            .all(|row| row.len() == width)
            .then_some(Self(rows))
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.0.first().map_or(0, Vec::len)
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.0.len()
    }

    /// Borrow the rows.
    pub fn rows(&self) -> &[Vec<bool>] {
        &self.0
    }

    /// Whether the cell at column `x`, row `y` is alive.
    ///
    /// Coordinates outside the grid read as dead.
    pub fn is_alive(&self, x: usize, y: usize) -> bool {
        self.0
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    /// Read a cell addressed by signed coordinates.
    ///
    /// Returns `None` when `(x, y)` lies outside the grid.
    pub fn cell(&self, x: i64, y: i64) -> Option<bool> {
        let (col, row) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.0.get(row)?.get(col).copied()
    }

    /// Set a cell addressed by signed coordinates.
    ///
    /// Returns `false` without touching the grid when `(x, y)` is out of
    /// range.
    pub fn set(&mut self, x: i64, y: i64, alive: bool) -> bool {
        self.cell_mut(x, y).is_some_and(|cell| {
            *cell = alive;
            true
        })
    }

    /// Flip a cell addressed by signed coordinates.
    ///
    /// Returns `false` without touching the grid when `(x, y)` is out of
    /// range.
    pub fn toggle(&mut self, x: i64, y: i64) -> bool {
        self.cell_mut(x, y).is_some_and(|cell| {
            *cell = !*cell;
            true
        })
    }

    /// Count of live cells.
    pub fn population(&self) -> usize {
        self.0
            .iter()
            .map(|row| row.iter().filter(|&&alive| alive).count())
            .sum()
    }

    /// Whether no cell is alive.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|row| row.iter().all(|&alive| !alive))
    }

    fn cell_mut(&mut self, x: i64, y: i64) -> Option<&mut bool> {
        let (col, row) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        self.0.get_mut(row)?.get_mut(col)
    }
}
