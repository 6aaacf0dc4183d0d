//! Eating, reproduction and death.

use crate::config::{Config, WorldConfig};
use crate::creature::{Creature, CreatureId};
use crate::evolution::{Archive, ArchiveEntry};
use crate::geometry::wrap_angle;
use crate::grid::FoodField;
use crate::neural::MutationConfig;
use rand::Rng;
use std::f32::consts::PI;

/// Energy one food item yields at the current max generation.
///
/// Early generations get a bonus that shrinks linearly to zero at
/// `food_energy_bonus_max_generation`.
pub fn food_energy_for(world: &WorldConfig, generation: u32) -> f32 {
    let max_gen = world.food_energy_bonus_max_generation;
    if max_gen == 0 || generation > max_gen {
        return world.food_energy;
    }
    let progress = generation as f32 / max_gen as f32;
    world.food_energy + (world.food_energy_bonus * (1.0 - progress)).round()
}

/// Eat the nearest food within `radius`. Returns the energy actually gained.
pub fn try_eat(
    creature: &mut Creature,
    food: &mut FoodField,
    radius: f32,
    energy_value: f32,
    max_energy: f32,
) -> Option<f32> {
    let cell = food.nearest_within(creature.position(), radius)?;
    food.remove(cell);
    Some(creature.gain_energy(energy_value, max_energy))
}

/// Offspring at the parent's position, facing away from it.
///
/// The parent pays down to `max_energy - reproduction_cost` and is flagged
/// for this tick.
pub fn reproduce<R: Rng + ?Sized>(
    parent: &mut Creature,
    child_id: CreatureId,
    mutation: &MutationConfig,
    config: &Config,
    rng: &mut R,
) -> Creature {
    let genome = mutation.offspring_genome(&parent.genome, rng);
    let angle = wrap_angle(parent.angle + PI);

    let mut child = Creature::new(
        child_id,
        parent.position(),
        angle,
        genome,
        parent.generation + 1,
        config,
    );
    child.wander_strength = rng.gen::<f32>();

    parent.energy = config.creatures.max_energy - config.creatures.reproduction_cost;
    parent.just_reproduced = true;
    child
}

/// Totals from one lifecycle pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LifecycleReport {
    pub births: usize,
    pub deaths: usize,
}

/// Reproduce saturated creatures, retire exhausted ones into the archive,
/// age the rest. Offspring are appended after all survivors.
pub fn run_lifecycle<R: Rng + ?Sized>(
    creatures: Vec<Creature>,
    next_id: &mut CreatureId,
    archive: &mut Archive,
    config: &Config,
    rng: &mut R,
) -> (Vec<Creature>, LifecycleReport) {
    let mutation = MutationConfig::from_config(&config.evolution);
    let max_energy = config.creatures.max_energy;
    let tick_ms = config.simulation.tick_interval_ms;

    let mut report = LifecycleReport::default();
    let mut survivors = Vec::with_capacity(creatures.len());
    let mut offspring = Vec::new();

    for mut creature in creatures {
        creature.just_reproduced = false;

        if creature.energy >= max_energy {
            let id = *next_id;
            *next_id += 1;
            offspring.push(reproduce(&mut creature, id, &mutation, config, rng));
            report.births += 1;
        } else if !creature.is_alive() {
            log::debug!(
                "Creature {} died at generation {} with score {}",
                creature.id,
                creature.generation,
                creature.score()
            );
            archive.insert(ArchiveEntry::from_creature(&creature));
            report.deaths += 1;
            continue;
        }

        creature.age_tick(tick_ms);
        survivors.push(creature);
    }

    survivors.extend(offspring);
    (survivors, report)
}
