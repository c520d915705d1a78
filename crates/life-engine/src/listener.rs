//! Event listener that turns published simulation events into logs.
//!
//! The engine subscribes to its [`BroadcastSink`] and feeds every event
//! through an [`EventLogger`]. Ticks are logged at debug level with a
//! progress line every [`PROGRESS_EVERY`] generations; with JSON logging
//! enabled the full serialized payload is emitted at trace level.
//!
//! [`BroadcastSink`]: life_core::sink::BroadcastSink

use life_types::SimulationEvent;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, trace, warn};

/// Generations between info-level progress lines.
pub const PROGRESS_EVERY: u64 = 100;

/// Why [`EventLogger::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// A tick reached the configured generation limit.
    GenerationLimit(u64),
    /// Every sender was dropped.
    Closed,
}

/// Logs events and watches for the generation limit.
#[derive(Debug, Clone, Copy)]
pub struct EventLogger {
    json: bool,
    max_generations: u64,
}

impl EventLogger {
    /// Create a logger. A `max_generations` of 0 means no limit.
    pub const fn new(json: bool, max_generations: u64) -> Self {
        Self {
            json,
            max_generations,
        }
    }

    /// Log one event. Returns the generation if it reached the limit.
    pub fn record(&self, event: &SimulationEvent) -> Option<u64> {
        if self.json {
            match serde_json::to_string(event) {
                Ok(payload) => trace!(event = event.name(), %payload, "Event published"),
                Err(e) => warn!(error = %e, "failed to serialize event"),
            }
        }

        match event {
            SimulationEvent::GameTick(state) => {
                let population = state.grid.population();
                debug!(generation = state.generation, population, "Game tick");
                if state.generation.checked_rem(PROGRESS_EVERY) == Some(0) {
                    info!(generation = state.generation, population, "Progress");
                }
                (self.max_generations > 0 && state.generation >= self.max_generations)
                    .then_some(state.generation)
            }
            SimulationEvent::CellUpdated { x, y, alive } => {
                debug!(x = *x, y = *y, alive = *alive, "Cell updated");
                None
            }
        }
    }

    /// Consume events until the generation limit is hit or the channel
    /// closes.
    pub async fn run(self, mut rx: broadcast::Receiver<SimulationEvent>) -> ListenerExit {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    if let Some(generation) = self.record(&event) {
                        info!(generation, "Generation limit reached");
                        return ListenerExit::GenerationLimit(generation);
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event listener fell behind, skipping events");
                }
                Err(RecvError::Closed) => return ListenerExit::Closed,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use life_core::sink::{BroadcastSink, EventSink};
    use life_types::{GameState, Grid};

    use super::*;

    fn tick(generation: u64) -> SimulationEvent {
        SimulationEvent::GameTick(GameState {
            grid: Grid::new(3, 3),
            generation,
            playing: true,
        })
    }

    #[test]
    fn unlimited_logger_never_stops() {
        let logger = EventLogger::new(false, 0);
        assert_eq!(logger.record(&tick(1)), None);
        assert_eq!(logger.record(&tick(1_000_000)), None);
    }

    #[test]
    fn limit_is_reported_on_reaching_tick() {
        let logger = EventLogger::new(true, 10);
        assert_eq!(logger.record(&tick(9)), None);
        assert_eq!(logger.record(&tick(10)), Some(10));
        assert_eq!(logger.record(&tick(12)), Some(12));
    }

    #[test]
    fn cell_updates_never_hit_the_limit() {
        let logger = EventLogger::new(false, 1);
        let event = SimulationEvent::CellUpdated {
            x: 0,
            y: 0,
            alive: true,
        };
        assert_eq!(logger.record(&event), None);
    }

    #[tokio::test]
    async fn run_stops_at_limit() {
        let sink = BroadcastSink::new();
        let rx = sink.subscribe();
        for generation in 1..=5 {
            sink.notify(&tick(generation));
        }
        let exit = EventLogger::new(false, 3).run(rx).await;
        assert_eq!(exit, ListenerExit::GenerationLimit(3));
    }

    #[tokio::test]
    async fn run_ends_when_sink_is_dropped() {
        let sink = BroadcastSink::new();
        let rx = sink.subscribe();
        sink.notify(&tick(1));
        drop(sink);
        let exit = EventLogger::new(false, 0).run(rx).await;
        assert_eq!(exit, ListenerExit::Closed);
    }
}
