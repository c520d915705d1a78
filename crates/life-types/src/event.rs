//! Outbound notifications published by the simulation controller.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::state::GameState;

/// Wire name of [`SimulationEvent::CellUpdated`].
pub const CELL_UPDATED: &str = "cell-updated";

/// Wire name of [`SimulationEvent::GameTick`].
pub const GAME_TICK: &str = "game-tick";

/// A state-change notification for the presentation layer.
///
/// Serialized adjacently tagged: `{"event": "game-tick", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
#[ts(export, export_to = "bindings/")]
pub enum SimulationEvent {
    /// A single cell was written by a drag-draw edit.
    ///
    /// Coordinates are echoed as received, even when they fell outside
    /// the grid and nothing changed.
    CellUpdated {
        /// Column.
        x: i64,
        /// Row.
        y: i64,
        /// Requested cell value.
        alive: bool,
    },
    /// Autoplay advanced one generation.
    GameTick(GameState),
}

impl SimulationEvent {
    /// The event name observers subscribe to.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CellUpdated { .. } => CELL_UPDATED,
            Self::GameTick(_) => GAME_TICK,
        }
    }
}
