//! Simulation thread that owns a [`Simulation`] and ticks it at a fixed interval.
//!
//! Observers talk to the thread through a command channel and read
//! snapshots from a single-slot mailbox that only keeps the newest one.
//! Commands are only handled between ticks, so nothing outside the thread
//! ever sees a half-updated world.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::{PlaceFoodError, SimError};
use crate::simulation::Simulation;

use super::commands::{SimCommand, SimState};
use super::snapshot::WorldSnapshot;

/// How long an idle (paused or stopped) loop waits for a command
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Holds at most one snapshot. A new snapshot replaces an unread one, so a
/// reader that falls behind costs one snapshot of memory, not a backlog.
#[derive(Default)]
struct SnapshotSlot {
    latest: Mutex<Option<WorldSnapshot>>,
    ready: Condvar,
}

impl SnapshotSlot {
    fn publish(&self, snapshot: WorldSnapshot) {
        if let Ok(mut latest) = self.latest.lock() {
            *latest = Some(snapshot);
            self.ready.notify_all();
        }
    }

    fn take(&self) -> Option<WorldSnapshot> {
        self.latest.lock().ok().and_then(|mut latest| latest.take())
    }

    fn take_timeout(&self, timeout: Duration) -> Option<WorldSnapshot> {
        let latest = self.latest.lock().ok()?;
        let (mut latest, _) = self
            .ready
            .wait_timeout_while(latest, timeout, |latest| latest.is_none())
            .ok()?;
        latest.take()
    }
}

/// Handle for controlling the simulation thread
pub struct SimulationHandle {
    id: String,
    /// Thread handle
    thread: Option<JoinHandle<()>>,
    /// Channel to send commands to simulation
    command_tx: Sender<SimCommand>,
    /// Newest snapshot not yet read
    snapshots: Arc<SnapshotSlot>,
    /// State as last published by the loop
    state: Arc<Mutex<SimState>>,
}

impl SimulationHandle {
    /// Spawn a new simulation thread. The world is loaded (or created)
    /// on the thread and starts ticking immediately.
    pub fn spawn(id: impl Into<String>, config: Config) -> Self {
        let id = id.into();
        let (command_tx, command_rx) = mpsc::channel();
        let snapshots = Arc::new(SnapshotSlot::default());
        let state = Arc::new(Mutex::new(SimState::Running));

        let thread_id = id.clone();
        let thread_state = Arc::clone(&state);
        let thread_snapshots = Arc::clone(&snapshots);
        let thread = thread::spawn(move || {
            let sim = Simulation::init(thread_id, config);
            run_simulation(sim, command_rx, &thread_snapshots, thread_state);
        });

        Self {
            id,
            thread: Some(thread),
            command_tx,
            snapshots,
            state,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Send a command to the simulation
    pub fn send(&self, command: SimCommand) {
        if self.command_tx.send(command).is_err() {
            log::warn!("[Simulation {}] thread is gone, command dropped", self.id);
        }
    }

    /// Queue a food placement and return the channel its outcome arrives on
    pub fn request_place_food(&self, x: i64, y: i64) -> Receiver<Result<(), PlaceFoodError>> {
        let (reply, outcome) = mpsc::channel();
        self.send(SimCommand::PlaceFood { x, y, reply });
        outcome
    }

    /// Place food and wait for the outcome. `None` if the thread did not
    /// answer within `timeout`.
    pub fn place_food(&self, x: i64, y: i64, timeout: Duration) -> Option<Result<(), PlaceFoodError>> {
        self.request_place_food(x, y).recv_timeout(timeout).ok()
    }

    /// Take the newest unread snapshot (non-blocking)
    pub fn try_recv_snapshot(&self) -> Option<WorldSnapshot> {
        self.snapshots.take()
    }

    /// Block until a snapshot is available or `timeout` passes
    pub fn recv_snapshot_timeout(&self, timeout: Duration) -> Option<WorldSnapshot> {
        self.snapshots.take_timeout(timeout)
    }

    /// Current loop state
    pub fn state(&self) -> SimState {
        self.state.lock().map(|s| *s).unwrap_or(SimState::Stopped)
    }

    /// Check if simulation is running
    pub fn is_running(&self) -> bool {
        self.state() == SimState::Running
    }

    /// Shutdown the simulation thread, waiting for its final save
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.command_tx.send(SimCommand::Shutdown);
            if thread.join().is_err() {
                log::error!("[Simulation {}] thread panicked", self.id);
            }
        }
    }
}

impl Drop for SimulationHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn publish_state(shared: &Mutex<SimState>, state: SimState) {
    if let Ok(mut s) = shared.lock() {
        *s = state;
    }
}

/// Main simulation loop running in separate thread
fn run_simulation(
    mut sim: Simulation,
    command_rx: Receiver<SimCommand>,
    snapshots: &SnapshotSlot,
    shared_state: Arc<Mutex<SimState>>,
) {
    let config = sim.config().clone();
    let tick_interval = Duration::from_millis(config.simulation.tick_interval_ms);
    let snapshot_interval = config.simulation.snapshot_interval.max(1);
    let save_interval = match config.persistence.save_interval_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    };

    let mut state = SimState::Running;
    let mut next_tick = Instant::now() + tick_interval;
    let mut last_save = Instant::now();

    log::info!(
        "[Simulation {}] tick loop started: interval={}ms, t={}",
        sim.id(),
        config.simulation.tick_interval_ms,
        sim.world().time()
    );

    // Send initial snapshot
    snapshots.publish(sim.snapshot());

    loop {
        let wait = if state == SimState::Running {
            next_tick.saturating_duration_since(Instant::now())
        } else {
            IDLE_POLL
        };

        // Commands are handled between ticks only
        match command_rx.recv_timeout(wait) {
            Ok(cmd) => {
                match cmd {
                    SimCommand::Pause => {
                        if state == SimState::Running {
                            state = SimState::Paused;
                            log::info!("[Simulation {}] paused", sim.id());
                        }
                    }
                    SimCommand::Resume => {
                        if state == SimState::Paused {
                            state = SimState::Running;
                            next_tick = Instant::now();
                            log::info!("[Simulation {}] resumed", sim.id());
                        }
                    }
                    SimCommand::Step => {
                        if state != SimState::Stopped {
                            if let Err(e) = sim.tick() {
                                state = state_after_failure(&e, state);
                            }
                            snapshots.publish(sim.snapshot());
                        }
                    }
                    SimCommand::Save => {
                        sim.save();
                    }
                    SimCommand::PlaceFood { x, y, reply } => {
                        let outcome = sim.place_food(x, y);
                        if outcome.is_ok() {
                            snapshots.publish(sim.snapshot());
                        }
                        let _ = reply.send(outcome);
                    }
                    SimCommand::Shutdown => {
                        sim.stop();
                        sim.save();
                        publish_state(&shared_state, SimState::Stopped);
                        return;
                    }
                }
                publish_state(&shared_state, state);
                continue;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // Every handle is gone; keep the world on disk
                sim.stop();
                sim.save();
                return;
            }
        }

        if state != SimState::Running {
            continue;
        }

        // An overrunning tick makes the next one due immediately
        let started = Instant::now();
        next_tick = started + tick_interval;

        match sim.tick() {
            Ok(_) => {
                if sim.world().time() % snapshot_interval == 0 {
                    snapshots.publish(sim.snapshot());
                }
            }
            Err(e) => {
                state = state_after_failure(&e, state);
                publish_state(&shared_state, state);
            }
        }

        if let Some(interval) = save_interval {
            if last_save.elapsed() >= interval {
                sim.save();
                last_save = Instant::now();
            }
        }
    }
}

/// Failed ticks are retried on the next interval until the retry limit stops the loop
fn state_after_failure(error: &SimError, current: SimState) -> SimState {
    match error {
        SimError::RetryLimitExceeded { .. } | SimError::Stopped => SimState::Stopped,
        SimError::Genome { .. } => current,
    }
}
