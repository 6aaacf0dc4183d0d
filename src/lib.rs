//! # neurogrid
//!
//! Tick-driven ecosystem simulator: creatures steered by small fixed-topology
//! neural networks forage on a bounded grid, and an archive of top performers
//! reseeds the population whenever it collapses.
//!
//! ## Features
//!
//! - **Deterministic**: seeded ChaCha random streams, identical runs per seed
//! - **Parallel**: perception and inference fan out over Rayon
//! - **Evolvable**: score-ranked archive with elite, mutated and random restarts
//! - **Configurable**: YAML configuration files
//! - **Persistent**: versioned binary saves with load-or-fresh fallback
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use neurogrid::{Config, World};
//!
//! let mut world = World::new(Config::default());
//! world.run(1000).unwrap();
//!
//! println!("Population: {}", world.population());
//! println!("Generation: {}", world.stats.generation);
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use neurogrid::{Config, World};
//! use neurogrid::checkpoint::Checkpoint;
//!
//! let mut world = World::new(Config::default());
//! world.run(1000).unwrap();
//!
//! world.create_checkpoint().save("state.bin").unwrap();
//!
//! let loaded = Checkpoint::load("state.bin").unwrap();
//! let restored = World::from_checkpoint(loaded).unwrap();
//! ```

pub mod checkpoint;
pub mod config;
pub mod creature;
pub mod error;
pub mod evolution;
pub mod geometry;
pub mod grid;
pub mod lifecycle;
pub mod motion;
pub mod neural;
pub mod perception;
pub mod shared;
pub mod simulation;
pub mod stats;
pub mod world;

#[cfg(feature = "web")]
pub mod web;

// Re-export main types
pub use config::Config;
pub use creature::Creature;
pub use error::SimError;
pub use simulation::Simulation;
pub use world::World;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a quick benchmark
pub fn benchmark(steps: u64, population: usize, seed: u64) -> Result<BenchmarkResult, SimError> {
    use std::time::Instant;

    let mut config = Config::default();
    config.creatures.initial_count = population.max(1);
    config.evolution.restart_threshold = config.evolution.restart_threshold.min(population.saturating_sub(1));

    let mut world = World::new_with_seed(config, seed);

    let start = Instant::now();
    world.run(steps)?;
    let elapsed = start.elapsed();

    Ok(BenchmarkResult {
        steps,
        initial_population: population,
        final_population: world.population(),
        elapsed_secs: elapsed.as_secs_f64(),
        steps_per_second: steps as f64 / elapsed.as_secs_f64().max(f64::EPSILON),
        generation: world.stats.generation,
        restarts: world.stats.restarts,
    })
}

/// Benchmark result
#[derive(Debug, Clone)]
pub struct BenchmarkResult {
    pub steps: u64,
    pub initial_population: usize,
    pub final_population: usize,
    pub elapsed_secs: f64,
    pub steps_per_second: f64,
    pub generation: u32,
    pub restarts: u64,
}

impl std::fmt::Display for BenchmarkResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Benchmark Results ===")?;
        writeln!(f, "Steps: {}", self.steps)?;
        writeln!(f, "Population: {} -> {}", self.initial_population, self.final_population)?;
        writeln!(f, "Time: {:.3}s", self.elapsed_secs)?;
        writeln!(f, "Speed: {:.1} steps/s", self.steps_per_second)?;
        writeln!(f, "Generation: {}", self.generation)?;
        writeln!(f, "Restarts: {}", self.restarts)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_quick_simulation() {
        let mut world = World::new_with_seed(Config::default(), 1);
        world.run(100).unwrap();
        assert_eq!(world.time(), 100);
    }

    #[test]
    fn test_benchmark() {
        let result = benchmark(50, 10, 7).unwrap();

        assert_eq!(result.steps, 50);
        assert!(result.steps_per_second > 0.0);
    }
}
