//! Archive of top performers and population restarts.

use crate::config::{Config, EvolutionConfig};
use crate::creature::{Creature, CreatureId};
use crate::grid::{random_free_cell, FoodField, ObstacleMap};
use crate::neural::{Genome, MutationConfig};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A retired creature kept as breeding stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub creature_id: CreatureId,
    pub score: f32,
    pub generation: u32,
    pub genome: Genome,
}

impl ArchiveEntry {
    pub fn from_creature(creature: &Creature) -> Self {
        Self {
            creature_id: creature.id,
            score: creature.score(),
            generation: creature.generation,
            genome: creature.genome.clone(),
        }
    }
}

/// Capacity-bounded list sorted non-increasing by score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archive {
    entries: Vec<ArchiveEntry>,
    capacity: usize,
}

impl Archive {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Insert at its rank; ties go ahead of older equal scores. Anything
    /// past capacity is dropped from the low end.
    ///
    /// Returns false if the entry itself fell off the end.
    pub fn insert(&mut self, entry: ArchiveEntry) -> bool {
        let pos = self.entries.partition_point(|e| e.score > entry.score);
        if pos >= self.capacity {
            return false;
        }
        self.entries.insert(pos, entry);
        self.entries.truncate(self.capacity);
        true
    }

    /// Multiply every score by `factor`; order is preserved
    pub fn decay(&mut self, factor: f32) {
        for entry in &mut self.entries {
            entry.score *= factor;
        }
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entry `i` modulo the archive length
    fn cycle(&self, i: usize) -> Option<&ArchiveEntry> {
        if self.entries.is_empty() {
            None
        } else {
            self.entries.get(i % self.entries.len())
        }
    }

    /// Bounded and sorted; used when loading saved state
    pub fn is_consistent(&self) -> bool {
        self.entries.len() <= self.capacity
            && self.entries.windows(2).all(|w| w[0].score >= w[1].score)
            && self.entries.iter().all(|e| e.score.is_finite())
    }
}

/// How a restart splits the population
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartPlan {
    pub elite: usize,
    pub mutated: usize,
    pub random: usize,
}

impl RestartPlan {
    /// `floor(n * ratio)` elites and mutants, the remainder random.
    /// With an empty archive everyone is random.
    pub fn new(population: usize, config: &EvolutionConfig, archive_empty: bool) -> Self {
        if archive_empty {
            return Self {
                elite: 0,
                mutated: 0,
                random: population,
            };
        }
        let share = |ratio: f32| ((population as f64 * ratio as f64) + 1e-6).floor() as usize;
        let elite = share(config.elite_ratio).min(population);
        let mutated = share(config.mutated_ratio).min(population - elite);
        Self {
            elite,
            mutated,
            random: population - elite - mutated,
        }
    }

    pub fn total(&self) -> usize {
        self.elite + self.mutated + self.random
    }
}

/// Build a fresh population from the archive.
///
/// Elites are exact clones and mutants are mutated copies, both cycling
/// through the archive from the top with `generation + 1`. The rest get
/// random genomes at generation 1. Creatures land on free cells; if the grid
/// has none left the remaining slots are skipped.
pub fn restart_population<R: Rng + ?Sized>(
    archive: &Archive,
    config: &Config,
    next_id: &mut CreatureId,
    obstacles: &ObstacleMap,
    food: &FoodField,
    rng: &mut R,
) -> Vec<Creature> {
    let plan = RestartPlan::new(config.creatures.initial_count, &config.evolution, archive.is_empty());
    let mutation = MutationConfig::from_config(&config.evolution);

    let mut seeds: Vec<(Genome, u32)> = Vec::with_capacity(plan.total());
    for i in 0..plan.elite {
        if let Some(parent) = archive.cycle(i) {
            seeds.push((parent.genome.clone(), parent.generation + 1));
        }
    }
    for i in 0..plan.mutated {
        if let Some(parent) = archive.cycle(i) {
            seeds.push((parent.genome.mutated(mutation.step, rng), parent.generation + 1));
        }
    }
    for _ in 0..plan.random {
        seeds.push((Genome::random(rng), 1));
    }

    let mut population = Vec::with_capacity(seeds.len());
    for (genome, generation) in seeds {
        let Some(cell) = random_free_cell(rng, obstacles, food) else {
            log::warn!("No free cell left for restart, population truncated to {}", population.len());
            break;
        };
        let id = *next_id;
        *next_id += 1;
        population.push(Creature::spawn(id, cell.to_point(), genome, generation, config, rng));
    }
    population
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::neural::GENOME_LEN;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn entry(id: CreatureId, score: f32) -> ArchiveEntry {
        ArchiveEntry {
            creature_id: id,
            score,
            generation: 1,
            genome: Genome::zeroed(),
        }
    }

    #[test]
    fn test_archive_sorted_and_bounded() {
        let mut archive = Archive::new(3);
        for (id, score) in [(1, 5.0), (2, 9.0), (3, 1.0), (4, 7.0), (5, 7.0)] {
            archive.insert(entry(id, score));
            assert!(archive.is_consistent());
        }

        let ids: Vec<_> = archive.entries().iter().map(|e| e.creature_id).collect();
        assert_eq!(ids, vec![2, 5, 4]);
    }

    #[test]
    fn test_archive_rejects_below_cutoff() {
        let mut archive = Archive::new(2);
        assert!(archive.insert(entry(1, 10.0)));
        assert!(archive.insert(entry(2, 8.0)));
        assert!(!archive.insert(entry(3, 1.0)));
        assert_eq!(archive.len(), 2);
        assert!(archive.entries().iter().all(|e| e.creature_id != 3));
    }

    #[test]
    fn test_archive_decay_preserves_order() {
        let mut archive = Archive::new(5);
        archive.insert(entry(1, 10.0));
        archive.insert(entry(2, 4.0));
        archive.decay(0.5);

        assert_eq!(archive.entries()[0].score, 5.0);
        assert_eq!(archive.entries()[1].score, 2.0);
        assert!(archive.is_consistent());
    }

    #[test]
    fn test_entry_from_creature() {
        let config = Config::default();
        let mut c = Creature::new(42, Point::new(3.0, 3.0), 0.0, Genome::zeroed(), 4, &config);
        c.stats.energy_gained = 230.0;

        let e = ArchiveEntry::from_creature(&c);
        assert_eq!(e.creature_id, 42);
        assert_eq!(e.score, 23.0);
        assert_eq!(e.generation, 4);
    }

    #[test]
    fn test_restart_plan_split() {
        let config = EvolutionConfig::default();
        assert_eq!(
            RestartPlan::new(10, &config, false),
            RestartPlan {
                elite: 2,
                mutated: 6,
                random: 2
            }
        );
        assert_eq!(RestartPlan::new(10, &config, true).random, 10);

        let uneven = EvolutionConfig {
            elite_ratio: 0.7,
            mutated_ratio: 0.3,
            ..EvolutionConfig::default()
        };
        assert_eq!(RestartPlan::new(10, &uneven, false).total(), 10);
        assert_eq!(RestartPlan::new(10, &uneven, false).elite, 7);
    }

    #[test]
    fn test_restart_from_empty_archive() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut config = Config::default();
        config.creatures.initial_count = 8;
        let obstacles = ObstacleMap::new(config.world.grid_size, &config.world.obstacles);
        let food = FoodField::new();
        let mut next_id = 100;

        let population = restart_population(&Archive::new(5), &config, &mut next_id, &obstacles, &food, &mut rng);

        assert_eq!(population.len(), 8);
        assert_eq!(next_id, 108);
        assert!(population.iter().all(|c| c.generation == 1 && c.genome.len() == GENOME_LEN));
    }

    #[test]
    fn test_restart_cycles_archive() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut config = Config::default();
        config.creatures.initial_count = 10;
        config.evolution.mutation_step = 0.5;

        let mut rng_genomes = ChaCha8Rng::seed_from_u64(3);
        let genome_a = Genome::random(&mut rng_genomes);
        let genome_b = Genome::random(&mut rng_genomes);

        let mut archive = Archive::new(5);
        archive.insert(ArchiveEntry {
            creature_id: 1,
            score: 10.0,
            generation: 3,
            genome: genome_a.clone(),
        });
        archive.insert(ArchiveEntry {
            creature_id: 2,
            score: 5.0,
            generation: 7,
            genome: genome_b.clone(),
        });

        let obstacles = ObstacleMap::new(config.world.grid_size, &config.world.obstacles);
        let mut next_id = 1;
        let population = restart_population(&archive, &config, &mut next_id, &obstacles, &FoodField::new(), &mut rng);
        assert_eq!(population.len(), 10);

        let generations: Vec<u32> = population.iter().map(|c| c.generation).collect();
        assert_eq!(generations, vec![4, 8, 4, 8, 4, 8, 4, 8, 1, 1]);

        assert_eq!(population[0].genome, genome_a);
        assert_eq!(population[1].genome, genome_b);
        for c in &population[2..8] {
            assert_ne!(c.genome, genome_a);
            assert_ne!(c.genome, genome_b);
        }
    }
}
