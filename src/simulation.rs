//! A World together with its lifecycle and failure policy.

use crate::checkpoint::{load_or_fresh, save_world};
use crate::config::Config;
use crate::error::{PlaceFoodError, SimError};
use crate::shared::WorldSnapshot;
use crate::world::{TickReport, World};

/// Owns one World and drives it tick by tick.
///
/// A failed tick leaves the World untouched. After `retry_limit`
/// consecutive failures the simulation stops for good.
pub struct Simulation {
    id: String,
    world: World,
    consecutive_failures: u32,
    stopped: bool,
}

impl Simulation {
    /// Load the saved world for this configuration or start fresh
    pub fn init(id: impl Into<String>, config: Config) -> Self {
        let world = load_or_fresh(&config.persistence.state_path, &config);
        Self::with_world(id, world)
    }

    /// Wrap an existing world
    pub fn with_world(id: impl Into<String>, world: World) -> Self {
        Self {
            id: id.into(),
            world,
            consecutive_failures: 0,
            stopped: false,
        }
    }

    /// Advance one tick, applying the retry policy.
    pub fn tick(&mut self) -> Result<TickReport, SimError> {
        if self.stopped {
            return Err(SimError::Stopped);
        }

        match self.world.step() {
            Ok(report) => {
                self.consecutive_failures = 0;
                if report.restarted {
                    log::info!(
                        "[Simulation {}] population restarted (restart #{})",
                        self.id,
                        self.world.stats.restarts
                    );
                    self.save();
                }
                let interval = self.world.config.logging.stats_interval;
                if interval > 0 && self.world.time() % interval == 0 {
                    log::info!("[Simulation {}] {}", self.id, self.world.stats.summary());
                }
                Ok(report)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                log::error!(
                    "[Simulation {}] tick failed ({} consecutive): {}",
                    self.id,
                    self.consecutive_failures,
                    e
                );
                if self.consecutive_failures >= self.world.config.simulation.retry_limit {
                    log::error!("[Simulation {}] retry limit reached, stopping", self.id);
                    self.stopped = true;
                    return Err(SimError::RetryLimitExceeded {
                        failures: self.consecutive_failures,
                    });
                }
                Err(e)
            }
        }
    }

    /// Consistent copy of the world after the last completed tick
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot::from_world(&self.world)
    }

    /// Best-effort save to the configured state path
    pub fn save(&self) -> bool {
        save_world(&self.world, &self.world.config.persistence.state_path)
    }

    /// Stop ticking; further ticks return [`SimError::Stopped`]
    pub fn stop(&mut self) {
        if !self.stopped {
            log::info!("[Simulation {}] stopped at t={}", self.id, self.world.time());
        }
        self.stopped = true;
    }

    /// Place food between ticks
    pub fn place_food(&mut self, x: i64, y: i64) -> Result<(), PlaceFoodError> {
        self.world.place_food(x, y)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &Config {
        &self.world.config
    }
}
