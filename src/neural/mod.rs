//! Neural controller for creature movement.
//!
//! A fixed 17-9-2 tanh network:
//! - Flat genome with Xavier-uniform initialization
//! - Per-weight clamped mutation
//! - Feature extraction from perception and internal state

mod features;
mod mutations;
mod network;

pub use features::{build_features, influence_vector, net_movement};
pub use mutations::MutationConfig;
pub use network::{
    forward, xavier_limit, Decision, Genome, GENOME_LEN, HIDDEN_SIZE, HIDDEN_WEIGHT_COUNT,
    INPUT_SIZE, OUTPUT_SIZE, OUTPUT_WEIGHT_COUNT,
};

use crate::config::CreatureConfig;
use crate::creature::Creature;
use crate::error::GenomeError;
use crate::perception::Perception;

/// Perception and internal state in, movement out
#[inline]
pub fn decide(
    creature: &Creature,
    perception: &Perception,
    config: &CreatureConfig,
) -> Result<Decision, GenomeError> {
    let inputs = build_features(
        creature,
        perception,
        config.max_energy,
        config.visibility_radius,
    );
    let outputs = forward(&creature.genome, &inputs)?;
    Ok(Decision::from_outputs(
        outputs,
        config.max_turn_angle,
        config.max_speed,
    ))
}
