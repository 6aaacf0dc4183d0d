//! Independent simulations keyed by id.

use std::collections::BTreeMap;

use crate::config::Config;
use crate::error::RegistryError;

use super::sim_thread::SimulationHandle;

/// Owns one [`SimulationHandle`] per id. Dropping the registry shuts
/// every simulation down.
#[derive(Default)]
pub struct SimulationRegistry {
    sims: BTreeMap<String, SimulationHandle>,
}

impl SimulationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a simulation under `id`
    pub fn start(&mut self, id: &str, config: Config) -> Result<&mut SimulationHandle, RegistryError> {
        if self.sims.contains_key(id) {
            return Err(RegistryError::AlreadyRunning(id.to_string()));
        }
        log::info!("Starting simulation {}", id);
        let handle = SimulationHandle::spawn(id, config);
        Ok(self.sims.entry(id.to_string()).or_insert(handle))
    }

    pub fn get(&self, id: &str) -> Option<&SimulationHandle> {
        self.sims.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut SimulationHandle> {
        self.sims.get_mut(id)
    }

    /// Shut a simulation down (final save included) and forget it
    pub fn stop(&mut self, id: &str) -> Result<(), RegistryError> {
        let mut handle = self
            .sims
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        handle.shutdown();
        log::info!("Stopped simulation {}", id);
        Ok(())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sims.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sims.is_empty()
    }

    pub fn shutdown_all(&mut self) {
        for (_, mut handle) in std::mem::take(&mut self.sims) {
            handle.shutdown();
        }
    }
}
