//! Headless runner for the toroidal Game of Life.
//!
//! Wires the simulation controller to a broadcast sink, logs every
//! published event, and keeps autoplay running until Ctrl-C or the
//! configured generation limit.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `life-config.yaml` (or `$LIFE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the broadcast sink and the simulation
//! 4. Optionally seed a random layout
//! 5. Start the event listener and autoplay
//! 6. Wait for Ctrl-C or the generation limit, then stop autoplay

mod error;
mod listener;

use std::path::PathBuf;
use std::sync::Arc;

use life_core::config::{LifeConfig, LoggingConfig};
use life_core::simulation::{Simulation, clamp_interval_ms};
use life_core::sink::{BroadcastSink, EventSink};
use tokio::runtime::Handle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::listener::EventLogger;

/// Config file looked up in the working directory.
const DEFAULT_CONFIG_PATH: &str = "life-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration is invalid or the Ctrl-C handler
/// cannot be installed.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);

    info!("life-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        width = config.grid.width,
        height = config.grid.height,
        interval_ms = clamp_interval_ms(config.autoplay.interval_ms),
        max_generations = config.autoplay.max_generations,
        "Simulation parameters"
    );

    // 3. Create the sink and the simulation.
    let sink = Arc::new(BroadcastSink::new());
    let events = sink.subscribe();
    let simulation = Simulation::from_config(
        &config.grid,
        Arc::clone(&sink) as Arc<dyn EventSink>,
        Handle::current(),
    );

    // 4. Seed the grid.
    if config.autoplay.randomize_on_launch {
        let _ = simulation.randomize();
    }

    // 5. Start listening, then playing.
    let logger = EventLogger::new(config.logging.json, config.autoplay.max_generations);
    let mut listener = tokio::spawn(logger.run(events));

    if config.autoplay.start_on_launch {
        simulation.start_auto_play(config.autoplay.interval_ms);
    } else {
        info!("Autoplay disabled at launch, waiting for Ctrl-C");
    }

    // 6. Run until interrupted or the limit is reached.
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(EngineError::from)?;
            info!("Interrupt received");
        }
        exit = &mut listener => match exit {
            Ok(reason) => info!(?reason, "Event listener finished"),
            Err(e) => warn!(error = %e, "Event listener task failed"),
        },
    }
    listener.abort();

    let final_state = simulation.stop_auto_play();
    info!(
        generation = final_state.generation,
        population = final_state.grid.population(),
        "life-engine shutdown complete"
    );

    Ok(())
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load configuration from `$LIFE_CONFIG` or `life-config.yaml`.
///
/// A missing file is not an error; defaults (plus environment
/// overrides) are used and the returned path is `None`.
fn load_config() -> Result<(LifeConfig, Option<PathBuf>), EngineError> {
    let path = std::env::var_os("LIFE_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        let config = LifeConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        Ok((LifeConfig::parse("")?, None))
    }
}
