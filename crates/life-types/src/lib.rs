//! Shared type definitions for the toroidal Game of Life engine.
//!
//! Types defined here cross the boundary to the presentation layer and
//! are exported to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`grid`] -- The boolean cell matrix
//! - [`state`] -- The `{grid, generation, playing}` snapshot
//! - [`event`] -- Outbound `cell-updated` / `game-tick` notifications

pub mod event;
pub mod grid;
pub mod state;

pub use event::{CELL_UPDATED, GAME_TICK, SimulationEvent};
pub use grid::Grid;
pub use state::GameState;
