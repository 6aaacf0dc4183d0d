//! Direction-limited perception: what a creature can see inside its cone.

use crate::config::CreatureConfig;
use crate::creature::Creature;
use crate::geometry::{wrap_angle, Point};
use crate::grid::{FoodField, ObstacleMap, SpatialIndex};

/// Radius- and angle-bounded visibility region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisionCone {
    pub radius: f32,
    /// Full opening angle in radians
    pub fov: f32,
}

impl VisionCone {
    pub fn from_config(config: &CreatureConfig) -> Self {
        Self {
            radius: config.visibility_radius,
            fov: config.visibility_fov,
        }
    }

    /// True if `target` is within range and inside the cone around `facing`
    #[inline]
    pub fn sees(&self, origin: Point, facing: f32, target: Point) -> bool {
        if origin.distance_sq(target) > self.radius * self.radius {
            return false;
        }
        let relative = wrap_angle(origin.heading_to(target) - facing);
        relative.abs() <= self.fov / 2.0
    }
}

/// Objects visible to one creature this tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Perception {
    pub food: Vec<Point>,
    pub obstacles: Vec<Point>,
    pub creatures: Vec<Point>,
}

/// Read-only view of the world used for perception queries
pub struct PerceptionContext<'a> {
    pub cone: VisionCone,
    pub obstacles: &'a ObstacleMap,
    pub food: &'a FoodField,
    pub creatures: &'a [Creature],
    pub index: &'a SpatialIndex,
}

impl<'a> PerceptionContext<'a> {
    /// Everything the creature at `self_idx` can see
    pub fn perceive(&self, self_idx: usize) -> Perception {
        let me = &self.creatures[self_idx];
        let origin = me.position();
        let facing = me.angle;
        let cone = self.cone;

        let food = self
            .food
            .iter()
            .map(|c| c.to_point())
            .filter(|&p| cone.sees(origin, facing, p))
            .collect();

        let obstacles = self
            .obstacles
            .interior()
            .iter()
            .copied()
            .chain(self.obstacles.border_cells_near(origin, cone.radius))
            .map(|c| c.to_point())
            .filter(|&p| cone.sees(origin, facing, p))
            .collect();

        let creatures = self
            .index
            .query_radius(origin, cone.radius)
            .into_iter()
            .filter(|&idx| idx != self_idx)
            .map(|idx| self.creatures[idx].position())
            .filter(|&p| cone.sees(origin, facing, p))
            .collect();

        Perception {
            food,
            obstacles,
            creatures,
        }
    }
}
