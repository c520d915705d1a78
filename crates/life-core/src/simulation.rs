//! Simulation controller: the single owner of grid state.
//!
//! [`Simulation`] holds the grid, the generation counter and the
//! autoplay session behind one mutex. Every operation takes the lock for
//! its whole duration, so no caller can observe a half-applied change,
//! and hands back an owned [`GameState`] snapshot.
//!
//! # Autoplay
//!
//! [`Simulation::start_auto_play`] spawns a tokio task that advances the
//! grid on a fixed period and publishes a `game-tick` event per advance.
//! Each session carries an id. A tick re-checks, under the lock, that
//! its session is still the active one before stepping, so once
//! [`Simulation::stop_auto_play`] (or `clear` / `randomize`) returns, no
//! further tick of that session applies.
//!
//! Events are published while the lock is still held, so observers see
//! them in exactly the order the changes were applied. A sink must
//! therefore never call back into the [`Simulation`] from `notify`.
//!
//! Controller operations never fail: out-of-range coordinates and
//! redundant start/stop calls are silent no-ops.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use life_types::{GameState, Grid, SimulationEvent};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::config::GridConfig;
use crate::grid;
use crate::sink::EventSink;

/// Shortest autoplay period, in milliseconds.
pub const MIN_INTERVAL_MS: u64 = 50;

/// Clamp a requested autoplay period to [`MIN_INTERVAL_MS`].
pub const fn clamp_interval_ms(interval_ms: u64) -> u64 {
    if interval_ms < MIN_INTERVAL_MS {
        MIN_INTERVAL_MS
    } else {
        interval_ms
    }
}

/// Handle to a running Game of Life simulation.
///
/// Cloning is cheap; all clones drive the same state. When the last
/// clone is dropped any autoplay task winds down on its next tick.
#[derive(Clone)]
pub struct Simulation {
    shared: Arc<Shared>,
}

struct Shared {
    width: usize,
    height: usize,
    state: Mutex<EngineState>,
    sink: Arc<dyn EventSink>,
    runtime: Handle,
}

/// Everything guarded by the state lock.
struct EngineState {
    grid: Grid,
    generation: u64,
    /// Present exactly while playing.
    session: Option<PlaybackSession>,
    next_session_id: u64,
}

/// An active autoplay run.
struct PlaybackSession {
    id: u64,
    interval: Duration,
    /// Dropping or firing this wakes the task so it can exit.
    cancel: oneshot::Sender<()>,
}

impl EngineState {
    fn snapshot(&self) -> GameState {
        GameState {
            grid: self.grid.clone(),
            generation: self.generation,
            playing: self.session.is_some(),
        }
    }

    fn advance(&mut self) {
        self.grid = grid::next_generation(&self.grid);
        self.generation = self.generation.saturating_add(1);
    }

    /// End the active session, if any. Returns whether one was running.
    fn cancel_session(&mut self) -> bool {
        self.session.take().is_some_and(|session| {
            // The task may already be gone; nothing to signal then.
            let _ = session.cancel.send(());
            debug!(session_id = session.id, "Autoplay session cancelled");
            true
        })
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, EngineState> {
        // No operation leaves the state half-written, so a panic in
        // another holder does not invalidate it.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advance one generation on behalf of autoplay session `session_id`
    /// and publish the resulting `game-tick`.
    ///
    /// Returns `None` if that session is no longer the active one.
    fn tick(&self, session_id: u64) -> Option<u64> {
        let mut state = self.lock();
        if state.session.as_ref().map(|session| session.id) != Some(session_id) {
            return None;
        }
        state.advance();
        self.sink.notify(&SimulationEvent::GameTick(state.snapshot()));
        Some(state.generation)
    }
}

impl Simulation {
    /// Create an idle simulation with an all-dead `width` x `height` grid.
    ///
    /// Autoplay tasks are spawned on `runtime`. Events go to `sink`.
    pub fn new(width: usize, height: usize, sink: Arc<dyn EventSink>, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                width,
                height,
                state: Mutex::new(EngineState {
                    grid: grid::make_grid(width, height),
                    generation: 0,
                    session: None,
                    next_session_id: 0,
                }),
                sink,
                runtime,
            }),
        }
    }

    /// Create an idle simulation sized by `config`.
    pub fn from_config(config: &GridConfig, sink: Arc<dyn EventSink>, runtime: Handle) -> Self {
        Self::new(config.width, config.height, sink, runtime)
    }

    /// Grid width in columns.
    pub fn width(&self) -> usize {
        self.shared.width
    }

    /// Grid height in rows.
    pub fn height(&self) -> usize {
        self.shared.height
    }

    /// Whether autoplay is active.
    pub fn is_playing(&self) -> bool {
        self.shared.lock().session.is_some()
    }

    /// Effective period of the active autoplay session.
    pub fn interval(&self) -> Option<Duration> {
        self.shared.lock().session.as_ref().map(|session| session.interval)
    }

    /// Current snapshot.
    pub fn get_state(&self) -> GameState {
        self.shared.lock().snapshot()
    }

    /// Flip the cell at column `x`, row `y`.
    ///
    /// Out-of-range coordinates leave the grid untouched. No event is
    /// published.
    pub fn toggle_cell(&self, x: i64, y: i64) -> GameState {
        let mut state = self.shared.lock();
        if !state.grid.toggle(x, y) {
            trace!(x, y, "Toggle outside grid ignored");
        }
        state.snapshot()
    }

    /// Set the cell at column `x`, row `y` to `alive`.
    ///
    /// Out-of-range coordinates leave the grid untouched, but a
    /// `cell-updated` event echoing the request is published either way.
    pub fn set_cell(&self, x: i64, y: i64, alive: bool) {
        let mut state = self.shared.lock();
        if !state.grid.set(x, y, alive) {
            trace!(x, y, "Set outside grid ignored");
        }
        debug!(x, y, alive, "Cell updated");
        // Published under the lock so concurrent writers cannot reorder
        // their events relative to the writes.
        self.shared
            .sink
            .notify(&SimulationEvent::CellUpdated { x, y, alive });
        drop(state);
    }

    /// Advance one generation.
    ///
    /// Allowed while autoplay runs; the manual step and the next tick
    /// are applied in whichever order they take the lock.
    pub fn step(&self) -> GameState {
        let mut state = self.shared.lock();
        state.advance();
        debug!(generation = state.generation, "Stepped");
        state.snapshot()
    }

    /// Start advancing automatically every `interval_ms` milliseconds.
    ///
    /// Periods under [`MIN_INTERVAL_MS`] are raised to it. Does nothing
    /// if autoplay is already active. The first tick fires one period
    /// after the call.
    pub fn start_auto_play(&self, interval_ms: u64) {
        let interval_ms = clamp_interval_ms(interval_ms);
        let interval = Duration::from_millis(interval_ms);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let session_id = {
            let mut state = self.shared.lock();
            if state.session.is_some() {
                debug!("Autoplay already running");
                return;
            }
            let id = state.next_session_id;
            state.next_session_id = id.wrapping_add(1);
            state.session = Some(PlaybackSession {
                id,
                interval,
                cancel: cancel_tx,
            });
            id
        };

        self.shared.runtime.spawn(run_autoplay(
            Arc::downgrade(&self.shared),
            session_id,
            interval,
            cancel_rx,
        ));
        info!(session_id, interval_ms, "Autoplay started");
    }

    /// Stop autoplay and return the state as of the stop.
    ///
    /// Does nothing if autoplay is not active.
    pub fn stop_auto_play(&self) -> GameState {
        let mut state = self.shared.lock();
        if state.cancel_session() {
            info!(generation = state.generation, "Autoplay stopped");
        }
        state.snapshot()
    }

    /// Stop autoplay, kill every cell and reset the generation to 0.
    pub fn clear(&self) -> GameState {
        let mut state = self.shared.lock();
        state.cancel_session();
        state.grid = grid::make_grid(self.shared.width, self.shared.height);
        state.generation = 0;
        info!("Grid cleared");
        state.snapshot()
    }

    /// Stop autoplay, fill the grid with a fresh random layout and reset
    /// the generation to 0.
    pub fn randomize(&self) -> GameState {
        let mut state = self.shared.lock();
        state.cancel_session();
        state.grid = grid::random_grid(self.shared.width, self.shared.height);
        state.generation = 0;
        info!(population = state.grid.population(), "Grid randomized");
        state.snapshot()
    }
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Simulation")
            .field("width", &self.shared.width)
            .field("height", &self.shared.height)
            .field("generation", &state.generation)
            .field("playing", &state.session.is_some())
            .finish_non_exhaustive()
    }
}

/// Autoplay loop for one session.
///
/// Holds only a weak reference so an abandoned simulation is freed; the
/// session's cancel sender lives inside it and wakes this task on drop.
async fn run_autoplay(
    shared: Weak<Shared>,
    session_id: u64,
    period: Duration,
    mut cancel: oneshot::Receiver<()>,
) {
    let start = Instant::now().checked_add(period).unwrap_or_else(Instant::now);
    let mut ticker = time::interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = &mut cancel => break,
            _ = ticker.tick() => {
                let Some(shared) = shared.upgrade() else { break };
                let Some(generation) = shared.tick(session_id) else { break };
                debug!(session_id, generation, "Autoplay tick");
            }
        }
    }
    debug!(session_id, "Autoplay task exited");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use life_types::CELL_UPDATED;

    use super::*;
    use crate::sink::{NoOpSink, RecordingSink};

    fn idle(width: usize, height: usize) -> Simulation {
        Simulation::new(width, height, Arc::new(NoOpSink), Handle::current())
    }

    fn recording(width: usize, height: usize) -> (Simulation, Arc<RecordingSink>) {
        let sink = Arc::new(RecordingSink::new());
        let sim = Simulation::new(
            width,
            height,
            Arc::clone(&sink) as Arc<dyn EventSink>,
            Handle::current(),
        );
        (sim, sink)
    }

    #[tokio::test]
    async fn starts_idle_with_dead_grid() {
        let sim = idle(40, 30);
        let state = sim.get_state();
        assert_eq!(state.generation, 0);
        assert!(!state.playing);
        assert_eq!(state.grid.width(), 40);
        assert_eq!(state.grid.height(), 30);
        assert!(state.grid.is_empty());
        assert_eq!(sim.interval(), None);
    }

    #[tokio::test]
    async fn toggle_twice_restores_cell() {
        let sim = idle(10, 10);
        let once = sim.toggle_cell(3, 4);
        assert_eq!(once.grid.cell(3, 4), Some(true));
        let twice = sim.toggle_cell(3, 4);
        assert_eq!(twice.grid.cell(3, 4), Some(false));
        assert_eq!(twice.generation, 0);
    }

    #[tokio::test]
    async fn toggle_out_of_range_is_ignored() {
        let sim = idle(10, 8);
        let before = sim.get_state();
        for (x, y) in [(10, 0), (0, 8), (-1, 0), (0, -1), (i64::MAX, i64::MIN)] {
            assert_eq!(sim.toggle_cell(x, y), before);
        }
    }

    #[tokio::test]
    async fn toggle_does_not_notify() {
        let (sim, sink) = recording(5, 5);
        let _ = sim.toggle_cell(1, 1);
        let _ = sim.toggle_cell(9, 9);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn set_cell_writes_and_notifies() {
        let (sim, sink) = recording(5, 5);
        sim.set_cell(2, 3, true);
        assert_eq!(sim.get_state().grid.cell(2, 3), Some(true));
        assert_eq!(
            sink.events(),
            vec![SimulationEvent::CellUpdated {
                x: 2,
                y: 3,
                alive: true
            }]
        );
    }

    #[tokio::test]
    async fn set_cell_notifies_even_when_nothing_changes() {
        // Unlike toggle_cell, set_cell always echoes the request.
        let (sim, sink) = recording(5, 5);
        let before = sim.get_state();

        sim.set_cell(5, 0, true);
        sim.set_cell(-3, 2, true);
        sim.set_cell(0, 0, false);

        assert_eq!(sim.get_state(), before);
        let events = sink.events();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|event| event.name() == CELL_UPDATED));
        assert_eq!(
            events.first(),
            Some(&SimulationEvent::CellUpdated {
                x: 5,
                y: 0,
                alive: true
            })
        );
    }

    /// Records events, stalling inside the first `notify`.
    #[derive(Default)]
    struct StallingSink {
        stalled: AtomicBool,
        inner: RecordingSink,
    }

    impl EventSink for StallingSink {
        fn notify(&self, event: &SimulationEvent) {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(200));
            }
            self.inner.notify(event);
        }
    }

    #[tokio::test]
    async fn concurrent_set_cell_events_follow_write_order() {
        let sink = Arc::new(StallingSink::default());
        let sim = Simulation::new(
            4,
            4,
            Arc::clone(&sink) as Arc<dyn EventSink>,
            Handle::current(),
        );

        std::thread::scope(|scope| {
            let first = sim.clone();
            scope.spawn(move || first.set_cell(0, 0, true));
            let second = sim.clone();
            scope.spawn(move || {
                std::thread::sleep(Duration::from_millis(50));
                second.set_cell(0, 0, false);
            });
        });

        let events = sink.inner.events();
        assert_eq!(
            events,
            vec![
                SimulationEvent::CellUpdated {
                    x: 0,
                    y: 0,
                    alive: true
                },
                SimulationEvent::CellUpdated {
                    x: 0,
                    y: 0,
                    alive: false
                },
            ]
        );
        assert_eq!(sim.get_state().grid.cell(0, 0), Some(false));
    }

    #[tokio::test]
    async fn step_increments_generation_by_one() {
        let sim = idle(10, 10);
        for expected in 1..=5 {
            assert_eq!(sim.step().generation, expected);
        }
    }

    #[tokio::test]
    async fn step_applies_the_rule() {
        let sim = idle(5, 5);
        for y in 1..=3 {
            let _ = sim.toggle_cell(2, y);
        }
        let horizontal = sim.step();
        assert_eq!(horizontal.grid.population(), 3);
        for x in 1..=3 {
            assert_eq!(horizontal.grid.cell(x, 2), Some(true));
        }
        let vertical = sim.step();
        for y in 1..=3 {
            assert_eq!(vertical.grid.cell(2, y), Some(true));
        }
        assert_eq!(vertical.generation, 2);
    }

    #[tokio::test]
    async fn snapshots_are_detached_copies() {
        let sim = idle(4, 4);
        let before = sim.get_state();
        let _ = sim.toggle_cell(0, 0);
        assert_eq!(before.grid.cell(0, 0), Some(false));
    }

    #[tokio::test]
    async fn clear_resets_everything() {
        let sim = idle(6, 6);
        let _ = sim.toggle_cell(1, 1);
        let _ = sim.step();
        sim.start_auto_play(100);

        let state = sim.clear();
        assert_eq!(state.generation, 0);
        assert!(state.grid.is_empty());
        assert!(!state.playing);
        assert!(!sim.is_playing());
    }

    #[tokio::test]
    async fn randomize_resets_generation_and_stops() {
        let sim = idle(40, 30);
        let _ = sim.step();
        sim.start_auto_play(100);

        let state = sim.randomize();
        assert_eq!(state.generation, 0);
        assert!(!state.playing);
        assert_eq!(state.grid.width(), 40);
        assert_eq!(state.grid.height(), 30);
        assert!(state.grid.population() > 0);
    }

    #[tokio::test]
    async fn stop_when_idle_returns_unchanged_state() {
        let sim = idle(5, 5);
        let _ = sim.toggle_cell(2, 2);
        let before = sim.get_state();
        assert_eq!(sim.stop_auto_play(), before);
        assert_eq!(sim.stop_auto_play(), before);
    }

    #[tokio::test]
    async fn start_sets_playing_and_second_start_is_ignored() {
        let sim = idle(5, 5);
        sim.start_auto_play(200);
        assert!(sim.get_state().playing);
        assert_eq!(sim.interval(), Some(Duration::from_millis(200)));

        sim.start_auto_play(75);
        assert_eq!(sim.interval(), Some(Duration::from_millis(200)));

        let stopped = sim.stop_auto_play();
        assert!(!stopped.playing);
        assert_eq!(sim.interval(), None);
    }

    #[tokio::test]
    async fn short_interval_is_raised_to_floor() {
        let sim = idle(5, 5);
        sim.start_auto_play(10);
        assert_eq!(sim.interval(), Some(Duration::from_millis(MIN_INTERVAL_MS)));
        let _ = sim.stop_auto_play();
    }

    #[test]
    fn clamp_interval_floor() {
        assert_eq!(clamp_interval_ms(0), 50);
        assert_eq!(clamp_interval_ms(10), 50);
        assert_eq!(clamp_interval_ms(50), 50);
        assert_eq!(clamp_interval_ms(51), 51);
        assert_eq!(clamp_interval_ms(1000), 1000);
    }

    #[tokio::test]
    async fn repeated_cancellation_is_safe() {
        let sim = idle(5, 5);
        sim.start_auto_play(50);
        let _ = sim.stop_auto_play();
        let _ = sim.stop_auto_play();
        let _ = sim.clear();
        let _ = sim.randomize();
        let _ = sim.clear();
        assert!(!sim.is_playing());
    }

    #[tokio::test]
    async fn dimensions_come_from_config() {
        let config = GridConfig {
            width: 12,
            height: 7,
        };
        let sim = Simulation::from_config(&config, Arc::new(NoOpSink), Handle::current());
        assert_eq!(sim.width(), 12);
        assert_eq!(sim.height(), 7);
        assert_eq!(sim.get_state().grid.height(), 7);
    }
}
