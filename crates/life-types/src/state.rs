//! Point-in-time snapshot of the simulation.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::grid::Grid;

/// Snapshot of `{grid, generation, playing}` handed to callers and
/// observers.
///
/// A snapshot is an owned copy. The engine keeps mutating its own grid
/// after issuing one, so holders never observe later changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GameState {
    /// Cell matrix, `grid[y][x]`.
    pub grid: Grid,
    /// Generations advanced since the last clear or randomize.
    pub generation: u64,
    /// Whether autoplay is active.
    pub playing: bool,
}
