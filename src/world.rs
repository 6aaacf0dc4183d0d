//! World simulation engine - the per-tick phase sequence.

use crate::checkpoint::Checkpoint;
use crate::config::Config;
use crate::creature::{Creature, CreatureId};
use crate::error::{CheckpointError, PlaceFoodError, SimError};
use crate::evolution::{restart_population, Archive, ArchiveEntry};
use crate::grid::{is_occupied, random_free_cell, Cell, FoodField, ObstacleMap, SpatialIndex};
use crate::lifecycle::{food_energy_for, run_lifecycle, try_eat};
use crate::motion::{apply_movement, charge_collisions, creature_contacts, settle_collisions};
use crate::neural::{decide, Decision};
use crate::perception::{PerceptionContext, VisionCone};
use crate::stats::Stats;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// What happened during one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub births: usize,
    pub deaths: usize,
    /// The population collapsed and was rebuilt from the archive
    pub restarted: bool,
}

/// The simulation world
pub struct World {
    // Population
    pub creatures: Vec<Creature>,

    // Environment
    pub food: FoodField,
    pub obstacles: ObstacleMap,
    spatial_index: SpatialIndex,

    // Evolution
    pub archive: Archive,

    // Statistics
    pub stats: Stats,

    // Configuration
    pub config: Config,

    // ID generation
    next_creature_id: CreatureId,

    // Random number generator (seeded for reproducibility)
    rng: ChaCha8Rng,
    seed: u64,
}

impl World {
    /// Create a new world with the given configuration
    pub fn new(config: Config) -> Self {
        let seed = config.simulation.seed.unwrap_or_else(|| rand::thread_rng().gen());
        Self::new_with_seed(config, seed)
    }

    /// Create a new world with a specific seed for reproducibility
    pub fn new_with_seed(config: Config, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let obstacles = ObstacleMap::new(config.world.grid_size, &config.world.obstacles);
        let archive = Archive::new(config.evolution.archive_capacity);
        let food = FoodField::new();

        let mut next_creature_id = 1;
        let creatures = restart_population(&archive, &config, &mut next_creature_id, &obstacles, &food, &mut rng);

        let mut world = Self {
            creatures,
            food,
            obstacles,
            spatial_index: SpatialIndex::new(),
            archive,
            stats: Stats::new(),
            config,
            next_creature_id,
            rng,
            seed,
        };

        world.replenish_food();
        world.update_stats();
        world.rebuild_spatial_index();

        log::info!(
            "Created world {}x{} with {} creatures and {} food (seed {})",
            world.config.world.grid_size,
            world.config.world.grid_size,
            world.creatures.len(),
            world.food.len(),
            seed
        );
        world
    }

    /// Restore a world from a validated checkpoint
    pub fn from_checkpoint(checkpoint: Checkpoint) -> Result<Self, CheckpointError> {
        checkpoint.validate()?;

        let config = checkpoint.config;
        let obstacles = ObstacleMap::new(config.world.grid_size, &config.world.obstacles);
        // Continue with a fresh stream rather than replaying the one from t = 0
        let rng = ChaCha8Rng::seed_from_u64(checkpoint.seed.wrapping_add(checkpoint.time));

        let mut world = Self {
            creatures: checkpoint.creatures,
            food: checkpoint.food,
            obstacles,
            spatial_index: SpatialIndex::new(),
            archive: checkpoint.archive,
            stats: checkpoint.stats,
            config,
            next_creature_id: checkpoint.next_creature_id,
            rng,
            seed: checkpoint.seed,
        };
        world.stats.time = checkpoint.time;
        world.update_stats();
        world.rebuild_spatial_index();
        Ok(world)
    }

    /// Create checkpoint of current state
    pub fn create_checkpoint(&self) -> Checkpoint {
        Checkpoint::new(
            self.stats.time,
            self.config.clone(),
            self.creatures.clone(),
            self.food.clone(),
            self.archive.clone(),
            self.stats.clone(),
            self.next_creature_id,
            self.seed,
        )
    }

    /// Advance the world by one tick.
    ///
    /// Every decision is computed before anything is mutated, so an integrity
    /// error leaves the world exactly as it was.
    pub fn step(&mut self) -> Result<TickReport, SimError> {
        // Phase 1: Index the pre-tick positions
        self.rebuild_spatial_index();

        // Phase 2: Parallel perception and inference
        let decisions = self.compute_decisions()?;

        // Phase 3: Movement, obstacles, eating
        let obstacle_hits = self.apply_decisions(&decisions);

        // Phase 4: Creature contacts on the new positions
        self.rebuild_spatial_index();
        let contacts = creature_contacts(
            &self.creatures,
            &self.spatial_index,
            self.config.creatures.interaction_radius,
        );
        for ((creature, &hit), contacts) in self.creatures.iter_mut().zip(&obstacle_hits).zip(contacts) {
            settle_collisions(creature, hit, contacts, &self.config.energy);
        }

        // Phase 5: Reproduction and death
        let creatures = std::mem::take(&mut self.creatures);
        let (creatures, turnover) = run_lifecycle(
            creatures,
            &mut self.next_creature_id,
            &mut self.archive,
            &self.config,
            &mut self.rng,
        );
        self.creatures = creatures;

        // Phase 6: Archive aging
        self.archive.decay(self.config.evolution.score_decay);

        // Phase 7: Restart a collapsed population
        let restarted = self.creatures.len() <= self.config.evolution.restart_threshold;
        if restarted {
            self.restart();
        }

        // Phase 8: Food
        self.replenish_food();

        // Phase 9: Statistics
        self.stats.time += 1;
        self.stats.record_turnover(turnover.births, turnover.deaths);
        self.update_stats();
        self.rebuild_spatial_index();

        Ok(TickReport {
            births: turnover.births,
            deaths: turnover.deaths,
            restarted,
        })
    }

    /// Decide for every creature against the same pre-tick state
    fn compute_decisions(&self) -> Result<Vec<Decision>, SimError> {
        let ctx = PerceptionContext {
            cone: VisionCone::from_config(&self.config.creatures),
            obstacles: &self.obstacles,
            food: &self.food,
            creatures: &self.creatures,
            index: &self.spatial_index,
        };

        self.creatures
            .par_iter()
            .enumerate()
            .map(|(idx, creature)| {
                let perception = ctx.perceive(idx);
                decide(creature, &perception, &self.config.creatures).map_err(|source| SimError::Genome {
                    creature_id: creature.id,
                    source,
                })
            })
            .collect()
    }

    /// Move, eat and wander each creature in order; returns which creatures hit an obstacle.
    /// The obstacle penalty lands before eating so a meal can still top a creature up to max.
    fn apply_decisions(&mut self, decisions: &[Decision]) -> Vec<bool> {
        let food_value = food_energy_for(&self.config.world, self.stats.generation);
        let creature_cfg = &self.config.creatures;

        let mut hits = Vec::with_capacity(self.creatures.len());
        for (creature, decision) in self.creatures.iter_mut().zip(decisions) {
            let outcome = apply_movement(creature, decision, &self.obstacles, creature_cfg, &self.config.energy);
            charge_collisions(creature, u32::from(outcome.collided()), &self.config.energy);
            try_eat(
                creature,
                &mut self.food,
                creature_cfg.interaction_radius,
                food_value,
                creature_cfg.max_energy,
            );
            creature.update_wander(creature_cfg.wander_jitter, &mut self.rng);
            hits.push(outcome.collided());
        }
        hits
    }

    /// Archive the survivors and rebuild the population from the archive
    fn restart(&mut self) {
        for creature in &self.creatures {
            self.archive.insert(ArchiveEntry::from_creature(creature));
        }

        let scores: Vec<String> = self
            .archive
            .entries()
            .iter()
            .map(|e| format!("{:.1}", e.score))
            .collect();
        if self.archive.is_empty() {
            log::info!("Population collapsed with an empty archive, seeding from scratch");
        } else {
            log::info!("Restarting population from archive, scores: [{}]", scores.join(", "));
        }

        self.creatures = restart_population(
            &self.archive,
            &self.config,
            &mut self.next_creature_id,
            &self.obstacles,
            &self.food,
            &mut self.rng,
        );
        self.stats.restarts += 1;
    }

    /// Add food on free cells while the energy budget and food cap allow
    pub fn replenish_food(&mut self) {
        let target = self.config.world.target_energy;
        let max_count = self.config.world.food_max_count;
        let mut total = self.total_energy();

        while total < target && self.food.len() < max_count {
            let Some(cell) = random_free_cell(&mut self.rng, &self.obstacles, &self.food) else {
                break;
            };
            self.food.insert(cell);
            total += self.config.world.food_energy;
        }
    }

    /// Creature energy plus the energy potential of all food
    pub fn total_energy(&self) -> f32 {
        let creature_energy: f32 = self.creatures.iter().map(|c| c.energy).sum();
        creature_energy + self.food.len() as f32 * self.config.world.food_energy
    }

    /// Place one food item.
    ///
    /// Rejects coordinates outside the grid, cells holding food or an
    /// obstacle, and a full food budget. Nothing changes on rejection.
    pub fn place_food(&mut self, x: i64, y: i64) -> Result<(), PlaceFoodError> {
        let n = self.config.world.grid_size as i64;
        if x < 0 || y < 0 || x >= n || y >= n {
            return Err(PlaceFoodError::InvalidCoordinates);
        }
        let cell = Cell::new(x as i32, y as i32);
        if is_occupied(&self.obstacles, &self.food, cell) {
            return Err(PlaceFoodError::Occupied);
        }
        if self.food.len() >= self.config.world.food_max_count {
            return Err(PlaceFoodError::CapacityReached);
        }

        self.food.insert(cell);
        self.stats.food_count = self.food.len();
        Ok(())
    }

    fn rebuild_spatial_index(&mut self) {
        self.spatial_index.rebuild(self.creatures.iter().map(Creature::position));
    }

    fn update_stats(&mut self) {
        self.stats.update(&self.creatures, self.food.len());
    }

    /// Run simulation for specified number of steps
    pub fn run(&mut self, steps: u64) -> Result<(), SimError> {
        for _ in 0..steps {
            self.step()?;
        }
        Ok(())
    }

    /// Run simulation with callback for progress updates
    pub fn run_with_callback<F>(&mut self, steps: u64, mut callback: F) -> Result<(), SimError>
    where
        F: FnMut(&World, &TickReport),
    {
        for _ in 0..steps {
            let report = self.step()?;
            callback(self, &report);
        }
        Ok(())
    }

    /// Completed ticks
    pub fn time(&self) -> u64 {
        self.stats.time
    }

    pub fn population(&self) -> usize {
        self.creatures.len()
    }

    pub fn grid_size(&self) -> usize {
        self.config.world.grid_size
    }

    /// Get seed for reproducibility
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn next_creature_id(&self) -> CreatureId {
        self.next_creature_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::motion::is_blocked;
    use crate::neural::Genome;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.world.grid_size = 30;
        config.creatures.initial_count = 12;
        config
    }

    #[test]
    fn test_world_creation() {
        let config = test_config();
        let world = World::new_with_seed(config.clone(), 1);

        assert_eq!(world.population(), config.creatures.initial_count);
        assert_eq!(world.time(), 0);
        assert!(world.food.len() <= config.world.food_max_count);
        assert!(world.creatures.iter().all(|c| !is_blocked(&world.obstacles, c.position())));

        let ids: Vec<_> = world.creatures.iter().map(|c| c.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_world_step_advances_time() {
        let mut world = World::new_with_seed(test_config(), 2);
        world.step().unwrap();
        assert_eq!(world.time(), 1);
        assert_eq!(world.stats.creature_count, world.creatures.len());
    }

    #[test]
    fn test_invariants_hold_over_many_ticks() {
        let config = test_config();
        let mut world = World::new_with_seed(config.clone(), 3);
        let n = config.world.grid_size as f32;
        let max_energy = config.creatures.max_energy;

        for _ in 0..300 {
            world.step().unwrap();
            for c in &world.creatures {
                assert!(c.energy >= 0.0 && c.energy <= max_energy, "energy {}", c.energy);
                assert!(c.x >= 0.0 && c.x < n && c.y >= 0.0 && c.y < n);
                assert!(c.angle > -std::f32::consts::PI && c.angle <= std::f32::consts::PI);
                assert!(!world.obstacles.is_obstacle(Cell::containing(c.position())));
            }
            assert!(world.archive.is_consistent());
            assert!(world.food.len() <= config.world.food_max_count);
        }
    }

    #[test]
    fn test_same_seed_same_world() {
        let mut a = World::new_with_seed(test_config(), 42);
        let mut b = World::new_with_seed(test_config(), 42);
        a.run(100).unwrap();
        b.run(100).unwrap();

        assert_eq!(a.creatures, b.creatures);
        assert_eq!(a.food.as_slice(), b.food.as_slice());
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_bad_genome_aborts_tick_untouched() {
        let mut world = World::new_with_seed(test_config(), 4);
        world.creatures[3].genome = Genome::from_raw(vec![0.0; 100]);
        let bad_id = world.creatures[3].id;
        let before = world.creatures.clone();
        let food_before = world.food.len();

        match world.step() {
            Err(SimError::Genome { creature_id, .. }) => assert_eq!(creature_id, bad_id),
            other => panic!("expected genome error, got {other:?}"),
        }
        assert_eq!(world.creatures, before);
        assert_eq!(world.food.len(), food_before);
        assert_eq!(world.time(), 0);
    }

    #[test]
    fn test_restart_when_population_collapses() {
        let mut config = test_config();
        config.evolution.restart_threshold = 2;
        let mut world = World::new_with_seed(config.clone(), 5);

        for c in world.creatures.iter_mut() {
            c.energy = 0.5;
        }
        world.food = FoodField::new();
        let report = world.step().unwrap();

        assert!(report.restarted);
        assert_eq!(world.stats.restarts, 1);
        assert_eq!(world.population(), config.creatures.initial_count);
        assert!(!world.archive.is_empty());
        assert!(world.archive.len() <= config.evolution.archive_capacity);
    }

    #[test]
    fn test_reproduction_in_step() {
        let config = test_config();
        let mut world = World::new_with_seed(config.clone(), 6);
        world.creatures.truncate(4);
        world.creatures[0].energy = config.creatures.max_energy;
        world.creatures[0].genome = Genome::zeroed();
        let parent_id = world.creatures[0].id;
        let parent_gen = world.creatures[0].generation;

        // Keep the parent at max energy through the activity cost
        world.config.energy.loss = 0.0;
        world.config.energy.collision_penalty = 0.0;
        let report = world.step().unwrap();

        assert_eq!(report.births, 1);
        let parent = world.creatures.iter().find(|c| c.id == parent_id).unwrap();
        assert_eq!(parent.energy, config.creatures.max_energy - config.creatures.reproduction_cost);
        let child = world.creatures.last().unwrap();
        assert_eq!(child.generation, parent_gen + 1);
        assert_eq!(child.id, world.next_creature_id() - 1);
    }

    #[test]
    fn test_place_food_rules() {
        let mut config = test_config();
        config.world.food_max_count = 0;
        config.world.obstacles = vec![Cell::new(5, 5)];
        let mut world = World::new_with_seed(config, 7);
        assert_eq!(world.food.len(), 0);
        world.config.world.food_max_count = 1;

        assert_eq!(world.place_food(-1, 3), Err(PlaceFoodError::InvalidCoordinates));
        assert_eq!(world.place_food(3, 30), Err(PlaceFoodError::InvalidCoordinates));
        assert_eq!(world.place_food(5, 5), Err(PlaceFoodError::Occupied));
        assert_eq!(world.place_food(0, 10), Err(PlaceFoodError::Occupied));
        assert_eq!(world.food.len(), 0);

        assert_eq!(world.place_food(10, 10), Ok(()));
        assert_eq!(world.stats.food_count, 1);
        assert_eq!(world.place_food(10, 10), Err(PlaceFoodError::Occupied));
        assert_eq!(world.place_food(11, 10), Err(PlaceFoodError::CapacityReached));
        assert_eq!(world.food.len(), 1);
    }

    #[test]
    fn test_replenish_respects_target() {
        let mut config = test_config();
        config.world.target_energy = 0.0;
        let world = World::new_with_seed(config, 8);
        assert!(world.food.is_empty());

        let mut config = test_config();
        config.world.target_energy = 1.0e9;
        config.world.food_max_count = 25;
        let world = World::new_with_seed(config, 8);
        assert_eq!(world.food.len(), 25);
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let mut world = World::new_with_seed(test_config(), 9);
        world.run(25).unwrap();

        let restored = World::from_checkpoint(world.create_checkpoint()).unwrap();
        assert_eq!(restored.time(), world.time());
        assert_eq!(restored.creatures, world.creatures);
        assert_eq!(restored.archive, world.archive);
        assert_eq!(restored.next_creature_id(), world.next_creature_id());
    }

    #[test]
    fn test_eating_in_step() {
        let mut config = test_config();
        config.world.target_energy = 0.0;
        config.world.obstacles.clear();
        let mut world = World::new_with_seed(config.clone(), 10);
        world.creatures.truncate(3);
        for (i, c) in world.creatures.iter_mut().enumerate() {
            *c = Creature::new(c.id, Point::new(5.0 + 6.0 * i as f32, 5.0), 0.0, Genome::zeroed(), 1, &config);
        }
        // Zero genome: half speed straight ahead
        world.food.insert(Cell::new(6, 5));
        world.config.evolution.restart_threshold = 0;

        world.step().unwrap();
        assert!(!world.food.contains(Cell::new(6, 5)));
        assert!(world.creatures[0].stats.energy_gained > 0.0);
    }

    #[test]
    fn test_wall_slide_then_eat_reproduces() {
        let mut config = test_config();
        config.world.grid_size = 20;
        config.world.obstacles.clear();
        config.world.target_energy = 0.0;
        config.evolution.restart_threshold = 0;
        let mut world = World::new_with_seed(config.clone(), 6);
        world.creatures.truncate(1);
        let id = world.creatures[0].id;
        // Zero genome moves half a cell into the west border and slides
        world.creatures[0] = Creature::new(id, Point::new(1.2, 5.0), std::f32::consts::PI, Genome::zeroed(), 1, &config);
        world.creatures[0].energy = 995.0;
        world.food = FoodField::new();
        world.food.insert(Cell::new(1, 5));

        let report = world.step().unwrap();
        assert!(!world.food.contains(Cell::new(1, 5)));
        assert_eq!(report.births, 1);
        assert_eq!(world.creatures.len(), 2);
        assert!(world.creatures[0].is_flashing());
    }
}
