//! Fixed-topology feed-forward controller and its genome.

use crate::error::GenomeError;
use ndarray::{ArrayView1, ArrayView2};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of input features
pub const INPUT_SIZE: usize = 17;
/// Hidden layer width
pub const HIDDEN_SIZE: usize = 9;
/// Output units: turn and speed
pub const OUTPUT_SIZE: usize = 2;
/// Weights feeding the hidden layer (row-major, one row per hidden unit)
pub const HIDDEN_WEIGHT_COUNT: usize = HIDDEN_SIZE * INPUT_SIZE;
/// Weights feeding the output layer
pub const OUTPUT_WEIGHT_COUNT: usize = OUTPUT_SIZE * HIDDEN_SIZE;
/// Total genome length
pub const GENOME_LEN: usize = HIDDEN_WEIGHT_COUNT + OUTPUT_WEIGHT_COUNT;

/// Xavier/Glorot uniform bound for a layer
#[inline]
pub fn xavier_limit(fan_in: usize, fan_out: usize) -> f32 {
    (6.0 / (fan_in + fan_out) as f32).sqrt()
}

/// Flat weight vector: hidden weights followed by output weights.
///
/// Deserialization accepts any length; [`Genome::validate`] and the forward
/// pass reject anything that does not match the topology.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Genome(Vec<f32>);

impl Genome {
    /// Fresh genome with Xavier-uniform weights per layer
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let hidden_limit = xavier_limit(INPUT_SIZE, HIDDEN_SIZE);
        let output_limit = xavier_limit(HIDDEN_SIZE, OUTPUT_SIZE);

        let mut weights = Vec::with_capacity(GENOME_LEN);
        weights.extend((0..HIDDEN_WEIGHT_COUNT).map(|_| rng.gen_range(-hidden_limit..=hidden_limit)));
        weights.extend((0..OUTPUT_WEIGHT_COUNT).map(|_| rng.gen_range(-output_limit..=output_limit)));
        Self(weights)
    }

    /// All-zero genome (outputs are always zero)
    pub fn zeroed() -> Self {
        Self(vec![0.0; GENOME_LEN])
    }

    /// Checked constructor
    pub fn from_weights(weights: Vec<f32>) -> Result<Self, GenomeError> {
        let genome = Self(weights);
        genome.validate()?;
        Ok(genome)
    }

    /// Unchecked constructor; the forward pass still refuses a bad length
    pub fn from_raw(weights: Vec<f32>) -> Self {
        Self(weights)
    }

    pub fn weights(&self) -> &[f32] {
        &self.0
    }

    pub(crate) fn weights_mut(&mut self) -> &mut [f32] {
        &mut self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length and finiteness check
    pub fn validate(&self) -> Result<(), GenomeError> {
        if self.0.len() != GENOME_LEN {
            return Err(GenomeError::LengthMismatch {
                expected: GENOME_LEN,
                found: self.0.len(),
            });
        }
        if let Some(index) = self.0.iter().position(|w| !w.is_finite()) {
            return Err(GenomeError::NonFinite { index });
        }
        Ok(())
    }

    pub fn hidden_weights(&self) -> &[f32] {
        &self.0[..HIDDEN_WEIGHT_COUNT.min(self.0.len())]
    }

    pub fn output_weights(&self) -> &[f32] {
        &self.0[HIDDEN_WEIGHT_COUNT.min(self.0.len())..]
    }
}

/// Run the network: `tanh(W_out · tanh(W_hidden · x))`.
#[inline]
pub fn forward(genome: &Genome, inputs: &[f32; INPUT_SIZE]) -> Result<[f32; OUTPUT_SIZE], GenomeError> {
    let weights = genome.weights();
    let mismatch = || GenomeError::LengthMismatch {
        expected: GENOME_LEN,
        found: weights.len(),
    };
    if weights.len() != GENOME_LEN {
        return Err(mismatch());
    }

    let hidden_w = ArrayView2::from_shape((HIDDEN_SIZE, INPUT_SIZE), &weights[..HIDDEN_WEIGHT_COUNT])
        .map_err(|_| mismatch())?;
    let output_w = ArrayView2::from_shape((OUTPUT_SIZE, HIDDEN_SIZE), &weights[HIDDEN_WEIGHT_COUNT..])
        .map_err(|_| mismatch())?;

    let x = ArrayView1::from(&inputs[..]);
    let hidden = hidden_w.dot(&x).mapv(f32::tanh);
    let output = output_w.dot(&hidden).mapv(f32::tanh);

    let mut result = [0.0f32; OUTPUT_SIZE];
    for (slot, value) in result.iter_mut().zip(output.iter()) {
        *slot = *value;
    }
    Ok(result)
}

/// Movement requested by the controller for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Decision {
    pub angle_delta: f32,
    pub speed: f32,
}

impl Decision {
    /// Scale raw `[-1, 1]` outputs to a turn in `[-max_turn, max_turn]` and a speed in `[0, max_speed]`
    #[inline]
    pub fn from_outputs(outputs: [f32; OUTPUT_SIZE], max_turn_angle: f32, max_speed: f32) -> Self {
        Self {
            angle_delta: outputs[0] * max_turn_angle,
            speed: ((outputs[1] + 1.0) / 2.0) * max_speed,
        }
    }
}
