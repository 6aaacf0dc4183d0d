//! Error types shared across the simulation.

use thiserror::Error;

/// Genome integrity failures. These are fatal for the tick that hits them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenomeError {
    #[error("genome length mismatch: expected {expected} weights, found {found}")]
    LengthMismatch { expected: usize, found: usize },
    #[error("genome contains a non-finite weight at index {index}")]
    NonFinite { index: usize },
}

/// Reasons a place-food command is rejected. The World is never mutated on error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlaceFoodError {
    #[error("Invalid coordinates")]
    InvalidCoordinates,
    #[error("Cell is occupied")]
    Occupied,
    #[error("Max food count reached")]
    CapacityReached,
}

/// Failures surfaced by the tick loop.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("integrity error in creature {creature_id}: {source}")]
    Genome {
        creature_id: u64,
        #[source]
        source: GenomeError,
    },
    #[error("tick failed {failures} consecutive times, simulation stopped")]
    RetryLimitExceeded { failures: u32 },
    #[error("simulation is stopped")]
    Stopped,
}

/// Registry bookkeeping errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("simulation {0} is already running")]
    AlreadyRunning(String),
    #[error("no simulation with id {0}")]
    NotFound(String),
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Errors that can occur during checkpoint operations
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Saved state rejected: {0}")]
    Invalid(String),
}
