//! Grid engine and simulation controller for the toroidal Game of Life.
//!
//! # Modules
//!
//! - [`grid`] -- Pure generation-advance rule on a wraparound grid, plus
//!   empty and pseudo-random grid construction.
//! - [`simulation`] -- [`Simulation`], the lock-guarded owner of grid,
//!   generation counter and autoplay session.
//! - [`sink`] -- [`EventSink`] trait through which the controller
//!   publishes `cell-updated` and `game-tick` notifications.
//! - [`config`] -- Configuration loading from `life-config.yaml`.
//!
//! [`Simulation`]: simulation::Simulation
//! [`EventSink`]: sink::EventSink

pub mod config;
pub mod grid;
pub mod simulation;
pub mod sink;
