//! Configuration system for the neurogrid simulation.
//!
//! Supports YAML configuration files with sensible defaults. Every value is
//! fixed for the lifetime of a World instance.

use crate::error::ConfigError;
use crate::grid::{default_obstacle_layout, Cell};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub world: WorldConfig,
    pub creatures: CreatureConfig,
    pub energy: EnergyConfig,
    pub evolution: EvolutionConfig,
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// World/environment configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Size of the square grid
    pub grid_size: usize,
    /// Maximum number of food items present at once
    pub food_max_count: usize,
    /// Food is replenished while creature energy + food potential stays below this
    pub target_energy: f32,
    /// Energy contained in one food item
    pub food_energy: f32,
    /// Extra energy per food item for early generations
    #[serde(default)]
    pub food_energy_bonus: f32,
    /// Last generation that still receives a (shrinking) food bonus
    #[serde(default)]
    pub food_energy_bonus_max_generation: u32,
    /// Interior obstacle cells (border cells are implicit)
    #[serde(default = "default_obstacle_layout")]
    pub obstacles: Vec<Cell>,
}

/// Creature body and senses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureConfig {
    /// Population size used for initial seeding and restarts
    pub initial_count: usize,
    pub initial_energy: f32,
    pub max_energy: f32,
    /// Energy the parent pays when it reproduces
    pub reproduction_cost: f32,
    /// Length of the recent-path ring buffer
    pub path_length: usize,
    /// Radius for eating and creature contact
    pub interaction_radius: f32,
    pub visibility_radius: f32,
    /// Full field-of-view angle in radians
    pub visibility_fov: f32,
    /// Maximum turn per tick in radians
    pub max_turn_angle: f32,
    /// Maximum distance travelled per tick
    pub max_speed: f32,
    /// Amplitude of the per-tick wander random walk
    pub wander_jitter: f32,
}

/// Energy accounting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    /// Scale applied to the activity cost
    pub loss: f32,
    pub loss_base: f32,
    pub loss_speed_factor: f32,
    pub loss_turn_factor: f32,
    /// Fixed energy lost on any collision
    pub collision_penalty: f32,
    /// Ticks the collision flash stays visible
    pub collision_flash_ticks: u32,
}

/// Evolution configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Probability that an offspring genome is mutated
    pub mutation_chance: f32,
    /// Width of the uniform perturbation applied to each weight
    pub mutation_step: f32,
    /// Maximum number of archived top performers
    pub archive_capacity: usize,
    /// Multiplicative archive score decay per tick
    pub score_decay: f32,
    /// Restart when the live population is at or below this
    pub restart_threshold: usize,
    /// Share of a restart cloned directly from the archive
    pub elite_ratio: f32,
    /// Share of a restart bred from mutated archive genomes
    pub mutated_ratio: f32,
}

/// Tick loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub tick_interval_ms: u64,
    /// Consecutive failed ticks tolerated before the loop stops
    pub retry_limit: u32,
    /// Random seed for reproducibility
    #[serde(default)]
    pub seed: Option<u64>,
    /// Ticks between snapshots pushed to observers
    #[serde(default = "default_snapshot_interval")]
    pub snapshot_interval: u64,
}

/// State file settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub state_path: PathBuf,
    /// Seconds between periodic saves (0 disables the timer)
    pub save_interval_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
    /// Ticks between stats log lines
    pub stats_interval: u64,
}

fn default_snapshot_interval() -> u64 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            creatures: CreatureConfig::default(),
            energy: EnergyConfig::default(),
            evolution: EvolutionConfig::default(),
            simulation: SimulationConfig::default(),
            persistence: PersistenceConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            grid_size: 50,
            food_max_count: 60,
            target_energy: 14_000.0,
            food_energy: 100.0,
            food_energy_bonus: 50.0,
            food_energy_bonus_max_generation: 5,
            obstacles: default_obstacle_layout(),
        }
    }
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            initial_count: 20,
            initial_energy: 500.0,
            max_energy: 1000.0,
            reproduction_cost: 500.0,
            path_length: 10,
            interaction_radius: 0.7,
            visibility_radius: 8.0,
            visibility_fov: 2.0 * std::f32::consts::FRAC_PI_3,
            max_turn_angle: 0.5,
            max_speed: 1.0,
            wander_jitter: 0.2,
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            loss: 2.0,
            loss_base: 1.0,
            loss_speed_factor: 1.0,
            loss_turn_factor: 0.5,
            collision_penalty: 10.0,
            collision_flash_ticks: 3,
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            mutation_chance: 0.2,
            mutation_step: 0.1,
            archive_capacity: 20,
            score_decay: 0.99,
            restart_threshold: 2,
            elite_ratio: 0.2,
            mutated_ratio: 0.6,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            retry_limit: 5,
            seed: None,
            snapshot_interval: default_snapshot_interval(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            state_path: PathBuf::from("data/state.bin"),
            save_interval_secs: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            stats_interval: 100,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));

        if self.world.grid_size < 3 || self.world.grid_size > 4096 {
            return invalid("grid_size must be between 3 and 4096");
        }
        if self.world.food_energy <= 0.0 {
            return invalid("food_energy must be > 0");
        }
        if self.creatures.initial_count == 0 {
            return invalid("initial_count must be > 0");
        }
        if self.creatures.max_energy <= 0.0 {
            return invalid("max_energy must be > 0");
        }
        if self.creatures.initial_energy <= 0.0
            || self.creatures.initial_energy > self.creatures.max_energy
        {
            return invalid("initial_energy must be in (0, max_energy]");
        }
        if self.creatures.reproduction_cost < 0.0
            || self.creatures.reproduction_cost > self.creatures.max_energy
        {
            return invalid("reproduction_cost must be in [0, max_energy]");
        }
        if self.creatures.path_length == 0 {
            return invalid("path_length must be > 0");
        }
        if self.creatures.visibility_radius <= 0.0
            || self.creatures.max_speed <= 0.0
            || self.creatures.max_turn_angle <= 0.0
            || self.creatures.interaction_radius <= 0.0
        {
            return invalid("radii, max_speed and max_turn_angle must be > 0");
        }
        if !(0.0..=std::f32::consts::TAU).contains(&self.creatures.visibility_fov) {
            return invalid("visibility_fov must be in [0, 2π]");
        }
        let evo = &self.evolution;
        if !(0.0..=1.0).contains(&evo.mutation_chance) {
            return invalid("mutation_chance must be in [0, 1]");
        }
        if evo.archive_capacity == 0 {
            return invalid("archive_capacity must be > 0");
        }
        if !(0.0..=1.0).contains(&evo.score_decay) {
            return invalid("score_decay must be in [0, 1]");
        }
        if !(0.0..=1.0).contains(&evo.elite_ratio)
            || !(0.0..=1.0).contains(&evo.mutated_ratio)
            || evo.elite_ratio + evo.mutated_ratio > 1.0 + f32::EPSILON
        {
            return invalid("elite_ratio and mutated_ratio must be in [0, 1] and sum to at most 1");
        }
        if evo.restart_threshold >= self.creatures.initial_count {
            return invalid("restart_threshold must be below initial_count");
        }
        if self.simulation.retry_limit == 0 {
            return invalid("retry_limit must be > 0");
        }
        if self.simulation.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be > 0");
        }
        Ok(())
    }
}
