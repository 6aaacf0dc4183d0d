//! Shared application state for the web server.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};

use crate::config::Config;
use crate::error::{PlaceFoodError, RegistryError};
use crate::shared::{SimCommand, SimState, SimulationRegistry, WorldSnapshot};

/// Maximum number of snapshots buffered per subscriber
const BROADCAST_CAPACITY: usize = 16;

/// Application state shared between all handlers
pub struct AppState {
    /// Running simulations (protected by mutex for exclusive access)
    registry: Mutex<SimulationRegistry>,
    /// Id of the simulation this server exposes
    sim_id: String,
    /// Broadcast channel for snapshots to WebSocket clients
    pub snapshot_tx: broadcast::Sender<Arc<WorldSnapshot>>,
    /// Most recent snapshot, served to new clients and `/api/state`
    latest: RwLock<Option<Arc<WorldSnapshot>>>,
    /// Configuration the simulation was started with
    pub config: Config,
}

impl AppState {
    /// Start the simulation `sim_id` and wrap it in shared state
    pub fn new(config: Config, sim_id: &str) -> Result<Self, RegistryError> {
        let mut registry = SimulationRegistry::new();
        registry.start(sim_id, config.clone())?;
        let (snapshot_tx, _) = broadcast::channel(BROADCAST_CAPACITY);

        Ok(Self {
            registry: Mutex::new(registry),
            sim_id: sim_id.to_string(),
            snapshot_tx,
            latest: RwLock::new(None),
            config,
        })
    }

    /// Send a command to the simulation. Returns false if it is not registered.
    pub async fn send_command(&self, command: SimCommand) -> bool {
        let registry = self.registry.lock().await;
        match registry.get(&self.sim_id) {
            Some(sim) => {
                sim.send(command);
                true
            }
            None => false,
        }
    }

    /// Queue a food placement; the outcome arrives on the returned channel
    pub async fn request_place_food(&self, x: i64, y: i64) -> Option<Receiver<Result<(), PlaceFoodError>>> {
        let registry = self.registry.lock().await;
        registry.get(&self.sim_id).map(|sim| sim.request_place_food(x, y))
    }

    /// Try to get the latest snapshot from the simulation
    pub async fn try_recv_snapshot(&self) -> Option<WorldSnapshot> {
        let registry = self.registry.lock().await;
        registry.get(&self.sim_id).and_then(|sim| sim.try_recv_snapshot())
    }

    /// Get current loop state
    pub async fn get_state(&self) -> SimState {
        let registry = self.registry.lock().await;
        registry
            .get(&self.sim_id)
            .map(|sim| sim.state())
            .unwrap_or(SimState::Stopped)
    }

    pub async fn latest_snapshot(&self) -> Option<Arc<WorldSnapshot>> {
        self.latest.read().await.clone()
    }

    /// Store and broadcast a snapshot to all WebSocket clients
    pub async fn publish_snapshot(&self, snapshot: Arc<WorldSnapshot>) {
        *self.latest.write().await = Some(Arc::clone(&snapshot));
        // No receivers is fine
        let _ = self.snapshot_tx.send(snapshot);
    }

    /// Subscribe to snapshot broadcasts
    pub fn subscribe_snapshots(&self) -> broadcast::Receiver<Arc<WorldSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Stop every simulation, waiting for their final saves
    pub async fn shutdown(&self) {
        let mut registry = self.registry.lock().await;
        tokio::task::block_in_place(|| registry.shutdown_all());
    }
}

/// Spawns a task that relays snapshots from the simulation thread to the broadcast channel
pub fn spawn_snapshot_relay(state: Arc<AppState>) {
    tokio::spawn(async move {
        let poll_interval = std::time::Duration::from_millis(33); // ~30fps

        loop {
            if let Some(snapshot) = state.try_recv_snapshot().await {
                state.publish_snapshot(Arc::new(snapshot)).await;
            }

            tokio::time::sleep(poll_interval).await;
        }
    });
}
