//! Checkpoint system for saving and loading simulation state.
//!
//! Files start with magic bytes and a bincode body carrying a format
//! version. Anything that does not decode, has another version or fails
//! validation is rejected whole; callers fall back to a fresh world.

use crate::config::Config;
use crate::creature::Creature;
use crate::error::CheckpointError;
use crate::evolution::Archive;
use crate::grid::{FoodField, ObstacleMap};
use crate::stats::Stats;
use crate::world::World;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"NGRD";

/// Complete simulation state for checkpointing
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Completed ticks
    pub time: u64,
    pub config: Config,
    pub creatures: Vec<Creature>,
    pub food: FoodField,
    pub archive: Archive,
    pub stats: Stats,
    pub next_creature_id: u64,
    /// Random seed (for reproducibility)
    pub seed: u64,
}

impl Checkpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    /// Create a new checkpoint
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time: u64,
        config: Config,
        creatures: Vec<Creature>,
        food: FoodField,
        archive: Archive,
        stats: Stats,
        next_creature_id: u64,
        seed: u64,
    ) -> Self {
        Self {
            version: Self::VERSION,
            time,
            config,
            creatures,
            food,
            archive,
            stats,
            next_creature_id,
            seed,
        }
    }

    /// Save checkpoint to a binary file, replacing it atomically
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);

            // Write magic bytes for identification
            writer.write_all(MAGIC)?;

            let encoded = bincode::serialize(self)?;
            writer.write_all(&encoded)?;
            writer.flush()?;
        }
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Load checkpoint from a binary file. The result is decoded and
    /// version-checked but not yet validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(CheckpointError::InvalidFormat("Invalid magic bytes".to_string()));
        }

        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;

        // The version is the first field, so it can be read even if the rest has drifted
        let version: u32 = bincode::deserialize(&buffer)?;
        if version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: version,
            });
        }

        Ok(bincode::deserialize(&buffer)?)
    }

    /// Switch to the running configuration. Only settings that do not
    /// reshape the world may differ.
    pub fn adopt_config(&mut self, config: &Config) -> Result<(), CheckpointError> {
        if self.config.world.grid_size != config.world.grid_size {
            return Err(CheckpointError::Invalid(format!(
                "grid size {} does not match configured {}",
                self.config.world.grid_size, config.world.grid_size
            )));
        }
        if self.config.world.obstacles != config.world.obstacles {
            return Err(CheckpointError::Invalid("obstacle layout differs from configuration".to_string()));
        }
        self.config = config.clone();
        Ok(())
    }

    /// Structural checks against the stored configuration
    pub fn validate(&self) -> Result<(), CheckpointError> {
        let invalid = |msg: String| Err(CheckpointError::Invalid(msg));

        if self.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: self.version,
            });
        }
        if let Err(e) = self.config.validate() {
            return invalid(e.to_string());
        }

        let grid = self.config.world.grid_size as f32;
        let max_energy = self.config.creatures.max_energy;
        let obstacles = ObstacleMap::new(self.config.world.grid_size, &self.config.world.obstacles);
        let mut ids = HashSet::with_capacity(self.creatures.len());

        for c in &self.creatures {
            if let Err(e) = c.genome.validate() {
                return invalid(format!("creature {}: {}", c.id, e));
            }
            if !ids.insert(c.id) || c.id >= self.next_creature_id {
                return invalid(format!("creature id {} is duplicated or ahead of the id counter", c.id));
            }
            if !(c.energy.is_finite() && (0.0..=max_energy).contains(&c.energy)) {
                return invalid(format!("creature {} energy {} out of range", c.id, c.energy));
            }
            let in_grid = |v: f32| v.is_finite() && v >= 0.0 && v < grid;
            if !in_grid(c.x) || !in_grid(c.y) || !c.angle.is_finite() {
                return invalid(format!("creature {} position ({}, {}) out of range", c.id, c.x, c.y));
            }
            if c.generation == 0 {
                return invalid(format!("creature {} has generation 0", c.id));
            }
        }

        for cell in self.food.iter() {
            if !obstacles.in_bounds(cell) || obstacles.is_obstacle(cell) {
                return invalid(format!("food at ({}, {}) is off the grid or on an obstacle", cell.x, cell.y));
            }
        }

        if self.archive.capacity() != self.config.evolution.archive_capacity || !self.archive.is_consistent() {
            return invalid("archive is unsorted or over capacity".to_string());
        }
        for entry in self.archive.entries() {
            if let Err(e) = entry.genome.validate() {
                return invalid(format!("archive entry {}: {}", entry.creature_id, e));
            }
        }
        Ok(())
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize
    }
}

/// Restore the saved world at `path`, or start fresh if there is none or it is unusable
pub fn load_or_fresh<P: AsRef<Path>>(path: P, config: &Config) -> World {
    let path = path.as_ref();
    if !path.exists() {
        log::info!("No saved state at {}, initializing a fresh world", path.display());
        return World::new(config.clone());
    }

    let restored = Checkpoint::load(path).and_then(|mut checkpoint| {
        checkpoint.adopt_config(config)?;
        World::from_checkpoint(checkpoint)
    });

    match restored {
        Ok(world) => {
            log::info!(
                "Loaded saved state from {} (t={}, {} creatures, {} archived)",
                path.display(),
                world.time(),
                world.population(),
                world.archive.len()
            );
            world
        }
        Err(e) => {
            log::warn!("Discarding saved state at {}: {}. Initializing a fresh world", path.display(), e);
            World::new(config.clone())
        }
    }
}

/// Best-effort save; failures are logged and swallowed
pub fn save_world<P: AsRef<Path>>(world: &World, path: P) -> bool {
    let path = path.as_ref();
    match world.create_checkpoint().save(path) {
        Ok(()) => {
            log::info!("Saved state to {} (t={})", path.display(), world.time());
            true
        }
        Err(e) => {
            log::error!("Failed to save state to {}: {}", path.display(), e);
            false
        }
    }
}
