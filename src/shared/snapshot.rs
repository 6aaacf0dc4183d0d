//! Read-only copies of world state for observers.
//!
//! A snapshot is built after a tick has fully completed and owns all of its
//! data, so the web layer can serialize it on another thread.

use serde::{Deserialize, Serialize};

use crate::creature::Creature;
use crate::grid::Cell;
use crate::world::World;

/// Round to two decimals for the wire
#[inline]
fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

/// Headline counters
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    pub restarts: u64,
    pub generation: u32,
    pub creature_count: usize,
    pub food_count: usize,
}

/// Lightweight view of a creature
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureView {
    pub id: u64,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub energy: f32,
    pub flashing: bool,
    pub generation: u32,
    pub score: f32,
    pub ms_lived: u64,
}

impl From<&Creature> for CreatureView {
    fn from(c: &Creature) -> Self {
        Self {
            id: c.id,
            x: round2(c.x),
            y: round2(c.y),
            angle: round2(c.angle),
            energy: round2(c.energy),
            flashing: c.is_flashing(),
            generation: c.generation,
            score: c.score(),
            ms_lived: c.stats.ms_lived,
        }
    }
}

/// Complete world snapshot
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldSnapshot {
    /// Completed ticks
    pub time: u64,
    pub stats: SnapshotStats,
    pub creatures: Vec<CreatureView>,
    pub food: Vec<Cell>,
    /// Interior obstacles; the border is implied by `grid_size`
    pub obstacles: Vec<Cell>,
    pub grid_size: usize,
}

impl WorldSnapshot {
    /// Create a snapshot from the current world state
    pub fn from_world(world: &World) -> Self {
        Self {
            time: world.time(),
            stats: SnapshotStats {
                restarts: world.stats.restarts,
                generation: world.stats.generation,
                creature_count: world.creatures.len(),
                food_count: world.food.len(),
            },
            creatures: world.creatures.iter().map(CreatureView::from).collect(),
            food: world.food.as_slice().to_vec(),
            obstacles: world.obstacles.interior().to_vec(),
            grid_size: world.grid_size(),
        }
    }

    pub fn creature(&self, id: u64) -> Option<&CreatureView> {
        self.creatures.iter().find(|c| c.id == id)
    }
}
