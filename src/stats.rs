//! Statistics tracking for the simulation.

use crate::creature::Creature;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Running statistics, updated at the end of every tick
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Completed ticks
    pub time: u64,
    /// Population restarts so far
    pub restarts: u64,
    /// Highest generation among live creatures
    pub generation: u32,
    pub creature_count: usize,
    pub food_count: usize,
    /// Mean energy across live creatures
    pub energy_mean: f32,
    /// Births in the last tick
    pub births: usize,
    /// Deaths in the last tick
    pub deaths: usize,
    pub total_births: u64,
    pub total_deaths: u64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh population-derived fields
    pub fn update(&mut self, creatures: &[Creature], food_count: usize) {
        self.creature_count = creatures.len();
        self.food_count = food_count;
        self.generation = creatures.iter().map(|c| c.generation).max().unwrap_or(0);
        self.energy_mean = if creatures.is_empty() {
            0.0
        } else {
            creatures.iter().map(|c| c.energy).sum::<f32>() / creatures.len() as f32
        };
    }

    /// Record one tick's births and deaths
    pub fn record_turnover(&mut self, births: usize, deaths: usize) {
        self.births = births;
        self.deaths = deaths;
        self.total_births += births as u64;
        self.total_deaths += deaths as u64;
    }

    /// Format stats as a one-line summary
    pub fn summary(&self) -> String {
        format!(
            "T:{:6} | Pop:{:4} | Gen:{:3} | Food:{:3} | Energy:{:.0} | Restarts:{} | +{} -{}",
            self.time,
            self.creature_count,
            self.generation,
            self.food_count,
            self.energy_mean,
            self.restarts,
            self.births,
            self.deaths,
        )
    }
}

/// Periodic stats samples
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StatsHistory {
    pub snapshots: Vec<Stats>,
    /// Ticks between samples
    pub interval: u64,
}

impl StatsHistory {
    pub fn new(interval: u64) -> Self {
        Self {
            snapshots: Vec::new(),
            interval: interval.max(1),
        }
    }

    /// Keep `stats` if it falls on the sampling interval
    pub fn maybe_record(&mut self, stats: &Stats) {
        if stats.time % self.interval == 0 {
            self.snapshots.push(stats.clone());
        }
    }

    pub fn population_series(&self) -> Vec<(u64, usize)> {
        self.snapshots
            .iter()
            .map(|s| (s.time, s.creature_count))
            .collect()
    }

    pub fn generation_series(&self) -> Vec<(u64, u32)> {
        self.snapshots.iter().map(|s| (s.time, s.generation)).collect()
    }

    /// Save history to a JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}
