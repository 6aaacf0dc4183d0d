//! Feature vector fed to the controller.
//!
//! Layout (index: feature):
//! - 0: energy level, `2 * energy / max - 1`
//! - 1: energy change since last tick, relative to max, clamped
//! - 2: just reproduced, `+1` / `-1`
//! - 3-4: food attraction (angle, magnitude)
//! - 5-6: obstacle repulsion (angle, magnitude)
//! - 7-8: creature repulsion (angle, magnitude)
//! - 9-10: net movement over the recent path (angle, magnitude)
//! - 11: turn since last tick
//! - 12-13: last displacement (angle, magnitude)
//! - 14: wander heading relative to facing
//! - 15: wander strength
//! - 16: bias

use super::network::INPUT_SIZE;
use crate::creature::Creature;
use crate::geometry::{angle_and_magnitude, wrap_angle, Point};
use crate::perception::Perception;
use std::f32::consts::{PI, SQRT_2};

/// Inverse-square weighted sum of unit vectors toward (or away from) each target, normalized.
///
/// Targets at the origin are ignored. Returns the zero vector when nothing contributes.
pub fn influence_vector(origin: Point, targets: &[Point], repel: bool) -> (f32, f32) {
    let (mut vx, mut vy) = (0.0f32, 0.0f32);
    for t in targets {
        let (dx, dy) = if repel {
            (origin.x - t.x, origin.y - t.y)
        } else {
            (t.x - origin.x, t.y - origin.y)
        };
        let dist_sq = dx * dx + dy * dy;
        if dist_sq > 0.0 {
            vx += dx / dist_sq;
            vy += dy / dist_sq;
        }
    }

    let mag = vx.hypot(vy);
    if mag > 0.0 {
        (vx / mag, vy / mag)
    } else {
        (0.0, 0.0)
    }
}

/// Oldest-to-newest displacement over the path, squashed per axis by `tanh(Δ / radius)`
pub fn net_movement<'a, I>(path: I, visibility_radius: f32) -> (f32, f32)
where
    I: IntoIterator<Item = &'a Point>,
    I::IntoIter: DoubleEndedIterator + ExactSizeIterator,
{
    let mut iter = path.into_iter();
    if iter.len() < 2 || visibility_radius <= 0.0 {
        return (0.0, 0.0);
    }
    match (iter.next(), iter.next_back()) {
        (Some(first), Some(last)) => (
            ((last.x - first.x) / visibility_radius).tanh(),
            ((last.y - first.y) / visibility_radius).tanh(),
        ),
        _ => (0.0, 0.0),
    }
}

/// Assemble the 17 inputs for one creature
pub fn build_features(
    creature: &Creature,
    perception: &Perception,
    max_energy: f32,
    visibility_radius: f32,
) -> [f32; INPUT_SIZE] {
    let origin = creature.position();
    let facing = creature.angle;

    let food = influence_vector(origin, &perception.food, false);
    let obstacles = influence_vector(origin, &perception.obstacles, true);
    let others = influence_vector(origin, &perception.creatures, true);
    let trend = net_movement(&creature.recent_path, visibility_radius);

    let (food_angle, food_mag) = angle_and_magnitude(food.0, food.1, facing);
    let (obs_angle, obs_mag) = angle_and_magnitude(obstacles.0, obstacles.1, facing);
    let (other_angle, other_mag) = angle_and_magnitude(others.0, others.1, facing);
    let (trend_angle, trend_mag) = angle_and_magnitude(trend.0, trend.1, facing);
    let (move_angle, move_mag) = angle_and_magnitude(
        creature.x - creature.prev.x,
        creature.y - creature.prev.y,
        facing,
    );

    [
        2.0 * (creature.energy / max_energy) - 1.0,
        ((creature.energy - creature.prev.energy) / max_energy).clamp(-1.0, 1.0),
        if creature.just_reproduced { 1.0 } else { -1.0 },
        food_angle,
        food_mag,
        obs_angle,
        obs_mag,
        other_angle,
        other_mag,
        trend_angle,
        trend_mag,
        wrap_angle(creature.angle - creature.prev.angle) / PI,
        move_angle,
        move_mag,
        wrap_angle(creature.wander_angle - creature.angle) / PI,
        (creature.wander_strength / SQRT_2).min(1.0),
        1.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::neural::Genome;
    use std::collections::VecDeque;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_influence_vector_single_target() {
        let (x, y) = influence_vector(Point::new(0.0, 0.0), &[Point::new(3.0, 0.0)], false);
        assert!((x - 1.0).abs() < EPS && y.abs() < EPS);

        let (x, y) = influence_vector(Point::new(0.0, 0.0), &[Point::new(3.0, 0.0)], true);
        assert!((x + 1.0).abs() < EPS && y.abs() < EPS);
    }

    #[test]
    fn test_influence_vector_closer_dominates() {
        let targets = [Point::new(1.0, 0.0), Point::new(0.0, 4.0)];
        let (x, y) = influence_vector(Point::new(0.0, 0.0), &targets, false);
        assert!(x > y * 3.0);
        assert!(((x * x + y * y).sqrt() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_influence_vector_empty_and_coincident() {
        assert_eq!(influence_vector(Point::new(1.0, 1.0), &[], false), (0.0, 0.0));
        assert_eq!(
            influence_vector(Point::new(1.0, 1.0), &[Point::new(1.0, 1.0)], true),
            (0.0, 0.0)
        );
    }

    #[test]
    fn test_net_movement() {
        let path: VecDeque<Point> = vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0), Point::new(4.0, 0.0)].into();
        let (x, y) = net_movement(&path, 8.0);
        assert!((x - 0.5f32.tanh()).abs() < EPS);
        assert_eq!(y, 0.0);

        let short: VecDeque<Point> = vec![Point::new(1.0, 1.0)].into();
        assert_eq!(net_movement(&short, 8.0), (0.0, 0.0));
    }

    #[test]
    fn test_build_features_fresh_creature() {
        let config = Config::default();
        let mut creature = Creature::new(1, Point::new(10.0, 10.0), 0.0, Genome::zeroed(), 1, &config);
        creature.energy = config.creatures.max_energy;
        creature.prev.energy = config.creatures.max_energy;

        let perception = Perception {
            food: vec![Point::new(12.0, 10.0)],
            ..Default::default()
        };
        let f = build_features(&creature, &perception, config.creatures.max_energy, 8.0);

        assert_eq!(f.len(), 17);
        assert!((f[0] - 1.0).abs() < EPS);
        assert_eq!(f[1], 0.0);
        assert_eq!(f[2], -1.0);
        // food straight ahead at full strength
        assert!(f[3].abs() < EPS);
        assert!((f[4] - 1.0 / SQRT_2).abs() < EPS);
        // nothing else seen
        assert_eq!(f[6], 0.0);
        assert_eq!(f[8], 0.0);
        assert_eq!(f[16], 1.0);
        assert!(f.iter().all(|v| v.is_finite() && (-1.0..=1.0).contains(v)));
    }

    #[test]
    fn test_build_features_reproduced_and_turned() {
        let config = Config::default();
        let mut creature = Creature::new(1, Point::new(5.0, 5.0), 0.5, Genome::zeroed(), 1, &config);
        creature.prev.angle = 0.0;
        creature.just_reproduced = true;

        let f = build_features(&creature, &Perception::default(), config.creatures.max_energy, 8.0);
        assert_eq!(f[2], 1.0);
        assert!((f[11] - 0.5 / PI).abs() < EPS);
    }
}
