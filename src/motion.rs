//! Movement integration and collision resolution.

use crate::config::{CreatureConfig, EnergyConfig};
use crate::creature::Creature;
use crate::geometry::{wrap_angle, Point};
use crate::grid::{Cell, ObstacleMap, SpatialIndex};
use crate::neural::Decision;

/// Creatures closer than this are treated as the same spot and never collide
const MIN_CONTACT_DISTANCE: f32 = 0.001;

/// How the obstacle check resolved a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Candidate position was free
    Clear,
    /// Blocked diagonally; kept one axis
    Slid,
    /// Neither axis free; stayed put
    Blocked,
}

impl MoveOutcome {
    #[inline]
    pub fn collided(self) -> bool {
        self != MoveOutcome::Clear
    }
}

/// Energy charged for one tick of activity
#[inline]
pub fn activity_cost(decision: &Decision, creatures: &CreatureConfig, energy: &EnergyConfig) -> f32 {
    let speed_share = decision.speed / creatures.max_speed;
    let turn_share = decision.angle_delta.abs() / creatures.max_turn_angle;
    energy.loss
        * (energy.loss_base + energy.loss_speed_factor * speed_share + energy.loss_turn_factor * turn_share)
}

/// Outside `[0, n-1]` on either axis, or inside an obstacle cell (interior or border)
#[inline]
pub fn is_blocked(obstacles: &ObstacleMap, p: Point) -> bool {
    let last = (obstacles.grid_size() - 1) as f32;
    if !(p.x.is_finite() && p.y.is_finite()) {
        return true;
    }
    if p.x < 0.0 || p.y < 0.0 || p.x > last || p.y > last {
        return true;
    }
    obstacles.is_obstacle(Cell::containing(p))
}

/// Resolve a move from `prev` to `candidate` against static obstacles.
///
/// A blocked move tries each axis on its own. With one axis free the creature
/// slides along it; with both free it keeps the axis of larger displacement.
pub fn resolve_obstacles(obstacles: &ObstacleMap, prev: Point, candidate: Point) -> (Point, MoveOutcome) {
    if !is_blocked(obstacles, candidate) {
        return (candidate, MoveOutcome::Clear);
    }

    let only_x = Point::new(candidate.x, prev.y);
    let only_y = Point::new(prev.x, candidate.y);
    let x_clear = !is_blocked(obstacles, only_x);
    let y_clear = !is_blocked(obstacles, only_y);

    match (x_clear, y_clear) {
        (true, false) => (only_x, MoveOutcome::Slid),
        (false, true) => (only_y, MoveOutcome::Slid),
        (true, true) => {
            if (candidate.x - prev.x).abs() > (candidate.y - prev.y).abs() {
                (only_x, MoveOutcome::Slid)
            } else {
                (only_y, MoveOutcome::Slid)
            }
        }
        (false, false) => (prev, MoveOutcome::Blocked),
    }
}

/// Turn, move, pay for it and resolve obstacles. Records the previous state
/// and the new path point. The collision penalty is left to the caller.
pub fn apply_movement(
    creature: &mut Creature,
    decision: &Decision,
    obstacles: &ObstacleMap,
    creatures: &CreatureConfig,
    energy: &EnergyConfig,
) -> MoveOutcome {
    creature.snapshot_prev();

    creature.angle = wrap_angle(creature.angle + decision.angle_delta);
    let prev = creature.position();
    let candidate = Point::new(
        prev.x + decision.speed * creature.angle.cos(),
        prev.y + decision.speed * creature.angle.sin(),
    );

    creature.spend_energy(activity_cost(decision, creatures, energy));

    let (resolved, outcome) = resolve_obstacles(obstacles, prev, candidate);
    let last = (obstacles.grid_size() - 1) as f32;
    creature.x = resolved.x.clamp(0.0, last);
    creature.y = resolved.y.clamp(0.0, last);

    creature.record_path(creatures.path_length);
    outcome
}

/// Number of other creatures within `radius` of each creature, via the 3x3 bucket lookup
pub fn creature_contacts(creatures: &[Creature], index: &SpatialIndex, radius: f32) -> Vec<u32> {
    creatures
        .iter()
        .enumerate()
        .map(|(i, c)| {
            let p = c.position();
            index
                .neighbors(p)
                .filter(|&j| j != i)
                .filter(|&j| {
                    let d = p.distance(creatures[j].position());
                    d < radius && d > MIN_CONTACT_DISTANCE
                })
                .count() as u32
        })
        .collect()
}

/// Charge the penalty once per collision and restart the flash countdown
pub fn charge_collisions(creature: &mut Creature, collisions: u32, energy: &EnergyConfig) {
    if collisions > 0 {
        creature.spend_energy(energy.collision_penalty * collisions as f32);
        creature.flash_ticks = energy.collision_flash_ticks;
    }
}

/// Charge creature contacts. The flash countdown only runs down when the
/// creature hit nothing this tick, obstacles included.
pub fn settle_collisions(creature: &mut Creature, hit_obstacle: bool, contacts: u32, energy: &EnergyConfig) {
    if contacts > 0 {
        charge_collisions(creature, contacts, energy);
    } else if !hit_obstacle {
        creature.flash_ticks = creature.flash_ticks.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::neural::Genome;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn open_map() -> ObstacleMap {
        ObstacleMap::new(20, &[])
    }

    fn creature_at(x: f32, y: f32, angle: f32) -> Creature {
        Creature::new(1, Point::new(x, y), angle, Genome::zeroed(), 1, &Config::default())
    }

    #[test]
    fn test_activity_cost() {
        let config = Config::default();
        let idle = Decision::default();
        // loss * base
        assert_eq!(activity_cost(&idle, &config.creatures, &config.energy), 2.0);

        let full = Decision {
            angle_delta: -config.creatures.max_turn_angle,
            speed: config.creatures.max_speed,
        };
        // 2 * (1 + 1 + 0.5)
        assert!((activity_cost(&full, &config.creatures, &config.energy) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_is_blocked() {
        let map = ObstacleMap::new(20, &[Cell::new(5, 5)]);
        assert!(is_blocked(&map, Point::new(5.5, 5.9)));
        assert!(is_blocked(&map, Point::new(0.5, 10.0)), "border cell");
        assert!(is_blocked(&map, Point::new(-0.1, 10.0)));
        assert!(is_blocked(&map, Point::new(10.0, 19.5)));
        assert!(is_blocked(&map, Point::new(f32::NAN, 3.0)));
        assert!(!is_blocked(&map, Point::new(4.9, 5.5)));
    }

    #[test]
    fn test_clear_move() {
        let (p, outcome) = resolve_obstacles(&open_map(), Point::new(5.0, 5.0), Point::new(5.7, 5.7));
        assert_eq!(outcome, MoveOutcome::Clear);
        assert_eq!(p, Point::new(5.7, 5.7));
    }

    #[test]
    fn test_slide_along_wall() {
        // Wall of obstacles at x = 6
        let walls: Vec<Cell> = (1..19).map(|y| Cell::new(6, y)).collect();
        let map = ObstacleMap::new(20, &walls);

        let (p, outcome) = resolve_obstacles(&map, Point::new(5.5, 5.0), Point::new(6.2, 5.6));
        assert_eq!(outcome, MoveOutcome::Slid);
        assert_eq!(p, Point::new(5.5, 5.6));
    }

    #[test]
    fn test_corner_picks_larger_axis() {
        // Only the diagonal cell is blocked
        let map = ObstacleMap::new(20, &[Cell::new(6, 6)]);

        let (p, outcome) = resolve_obstacles(&map, Point::new(5.5, 5.5), Point::new(6.3, 6.1));
        assert_eq!(outcome, MoveOutcome::Slid);
        assert_eq!(p, Point::new(6.3, 5.5));

        let (p, _) = resolve_obstacles(&map, Point::new(5.5, 5.5), Point::new(6.1, 6.3));
        assert_eq!(p, Point::new(5.5, 6.3));
    }

    #[test]
    fn test_fully_blocked_stays_put() {
        let map = ObstacleMap::new(20, &[Cell::new(6, 6), Cell::new(6, 5), Cell::new(5, 6)]);
        let prev = Point::new(5.5, 5.5);
        let (p, outcome) = resolve_obstacles(&map, prev, Point::new(6.2, 6.2));
        assert_eq!(outcome, MoveOutcome::Blocked);
        assert_eq!(p, prev);
    }

    #[test]
    fn test_apply_movement_updates_state() {
        let config = Config::default();
        let mut c = creature_at(5.0, 5.0, 0.0);
        let before = c.energy;
        let decision = Decision {
            angle_delta: FRAC_PI_2,
            speed: 1.0,
        };

        let outcome = apply_movement(&mut c, &decision, &open_map(), &config.creatures, &config.energy);

        assert_eq!(outcome, MoveOutcome::Clear);
        assert!((c.angle - FRAC_PI_2).abs() < 1e-6);
        assert!((c.x - 5.0).abs() < 1e-5);
        assert!((c.y - 6.0).abs() < 1e-5);
        assert_eq!(c.prev.x, 5.0);
        assert_eq!(c.prev.energy, before);
        assert!(c.energy < before);
        assert_eq!(c.recent_path.len(), 2);
    }

    #[test]
    fn test_apply_movement_into_border() {
        let config = Config::default();
        let mut c = creature_at(1.2, 10.0, std::f32::consts::PI);
        let decision = Decision {
            angle_delta: 0.0,
            speed: 1.0,
        };

        let outcome = apply_movement(&mut c, &decision, &open_map(), &config.creatures, &config.energy);
        assert!(outcome.collided());
        assert!(!is_blocked(&open_map(), c.position()));
    }

    #[test]
    fn test_never_enters_obstacle() {
        let config = Config::default();
        let map = ObstacleMap::new(12, &[Cell::new(5, 5), Cell::new(6, 5), Cell::new(5, 6)]);
        let mut c = creature_at(4.5, 4.5, FRAC_PI_4);
        for step in 0..200 {
            let decision = Decision {
                angle_delta: if step % 7 == 0 { 0.4 } else { -0.1 },
                speed: 1.0,
            };
            apply_movement(&mut c, &decision, &map, &config.creatures, &config.energy);
            c.energy = 500.0;
            assert!(!is_blocked(&map, c.position()), "step {step}: {:?}", c.position());
        }
    }

    #[test]
    fn test_creature_contacts() {
        let creatures = vec![
            creature_at(5.0, 5.0, 0.0),
            creature_at(5.5, 5.0, 0.0),
            creature_at(5.0, 5.0, 0.0),
            creature_at(9.0, 9.0, 0.0),
        ];
        let mut index = SpatialIndex::new();
        index.rebuild(creatures.iter().map(Creature::position));

        let contacts = creature_contacts(&creatures, &index, 0.7);
        // 0 and 2 overlap exactly, which does not count
        assert_eq!(contacts, vec![1, 2, 1, 0]);
    }

    #[test]
    fn test_settle_collisions_flash() {
        let config = Config::default();
        let mut c = creature_at(5.0, 5.0, 0.0);
        let before = c.energy;

        settle_collisions(&mut c, false, 2, &config.energy);
        assert_eq!(c.energy, before - 2.0 * config.energy.collision_penalty);
        assert_eq!(c.flash_ticks, config.energy.collision_flash_ticks);
        assert!(c.is_flashing());

        for _ in 0..10 {
            settle_collisions(&mut c, false, 0, &config.energy);
        }
        assert_eq!(c.flash_ticks, 0);
    }

    #[test]
    fn test_obstacle_hit_keeps_flash() {
        let config = Config::default();
        let mut c = creature_at(5.0, 5.0, 0.0);
        let before = c.energy;

        charge_collisions(&mut c, 1, &config.energy);
        settle_collisions(&mut c, true, 0, &config.energy);
        assert_eq!(c.energy, before - config.energy.collision_penalty);
        assert_eq!(c.flash_ticks, config.energy.collision_flash_ticks);

        settle_collisions(&mut c, false, 0, &config.energy);
        assert_eq!(c.flash_ticks, config.energy.collision_flash_ticks - 1);
    }
}
