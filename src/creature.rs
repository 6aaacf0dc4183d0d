//! Creature state and per-tick bookkeeping.

use crate::config::Config;
use crate::geometry::{wrap_angle, Point};
use crate::neural::Genome;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f32::consts::PI;

/// Unique creature identifier, never reused within a World
pub type CreatureId = u64;

/// State at the start of the current tick
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PrevState {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub energy: f32,
}

/// Lifetime statistics used for scoring
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CreatureStats {
    /// Energy actually added by eating (after the max-energy cap)
    pub energy_gained: f32,
    pub ticks_survived: u64,
    pub ms_lived: u64,
}

/// A creature in the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    // Identity
    pub id: CreatureId,
    pub generation: u32,

    // Physical state
    pub x: f32,
    pub y: f32,
    /// Facing in `(-π, π]`
    pub angle: f32,
    pub energy: f32,

    // Controller
    pub genome: Genome,

    /// Most recent positions, oldest first
    pub recent_path: VecDeque<Point>,
    pub prev: PrevState,

    // Transient flags
    pub just_reproduced: bool,
    /// Collision feedback countdown
    pub flash_ticks: u32,

    // Wander signal
    pub wander_angle: f32,
    pub wander_strength: f32,

    pub stats: CreatureStats,
}

impl Creature {
    /// Create a creature with the configured initial energy
    pub fn new(
        id: CreatureId,
        position: Point,
        angle: f32,
        genome: Genome,
        generation: u32,
        config: &Config,
    ) -> Self {
        let angle = wrap_angle(angle);
        let energy = config.creatures.initial_energy.min(config.creatures.max_energy);
        let mut recent_path = VecDeque::with_capacity(config.creatures.path_length);
        recent_path.push_back(position);

        Self {
            id,
            generation: generation.max(1),
            x: position.x,
            y: position.y,
            angle,
            energy,
            genome,
            recent_path,
            prev: PrevState {
                x: position.x,
                y: position.y,
                angle,
                energy,
            },
            just_reproduced: false,
            flash_ticks: 0,
            wander_angle: angle,
            wander_strength: 0.0,
            stats: CreatureStats::default(),
        }
    }

    /// New creature with random facing and wander state
    pub fn spawn<R: Rng + ?Sized>(
        id: CreatureId,
        position: Point,
        genome: Genome,
        generation: u32,
        config: &Config,
        rng: &mut R,
    ) -> Self {
        let angle = random_angle(rng);
        let mut creature = Self::new(id, position, angle, genome, generation, config);
        creature.wander_angle = random_angle(rng);
        creature.wander_strength = rng.gen::<f32>();
        creature
    }

    #[inline]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.energy > 0.0
    }

    #[inline]
    pub fn is_flashing(&self) -> bool {
        self.flash_ticks > 0
    }

    /// Archive score: `round(energy_gained / 10)`
    #[inline]
    pub fn score(&self) -> f32 {
        (self.stats.energy_gained / 10.0).round()
    }

    /// Remember the current state as the previous one
    pub fn snapshot_prev(&mut self) {
        self.prev = PrevState {
            x: self.x,
            y: self.y,
            angle: self.angle,
            energy: self.energy,
        };
    }

    /// Append the current position, dropping the oldest beyond `max_len`
    pub fn record_path(&mut self, max_len: usize) {
        self.recent_path.push_back(self.position());
        while self.recent_path.len() > max_len.max(1) {
            self.recent_path.pop_front();
        }
    }

    /// Random-walk the wander heading
    pub fn update_wander<R: Rng + ?Sized>(&mut self, jitter: f32, rng: &mut R) {
        self.wander_angle = wrap_angle(self.wander_angle + (rng.gen::<f32>() - 0.5) * jitter);
    }

    /// Count one survived tick
    pub fn age_tick(&mut self, tick_ms: u64) {
        self.stats.ticks_survived += 1;
        self.stats.ms_lived += tick_ms;
    }

    /// Add energy capped at `max_energy`; returns the amount actually added
    pub fn gain_energy(&mut self, amount: f32, max_energy: f32) -> f32 {
        let before = self.energy;
        self.energy = (self.energy + amount.max(0.0)).min(max_energy);
        let gained = self.energy - before;
        self.stats.energy_gained += gained;
        gained
    }

    /// Subtract energy, floored at zero
    #[inline]
    pub fn spend_energy(&mut self, amount: f32) {
        self.energy = (self.energy - amount.max(0.0)).max(0.0);
    }
}

/// Uniform heading in `(-π, π]`
pub fn random_angle<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    wrap_angle(rng.gen_range(-PI..PI))
}
