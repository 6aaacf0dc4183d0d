//! Genome mutation.

use super::network::Genome;
use rand::Rng;

/// Configuration for mutation operations
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MutationConfig {
    /// Probability that a reproduction mutates the offspring genome
    pub chance: f32,
    /// Width of the uniform perturbation applied to every weight
    pub step: f32,
}

impl Default for MutationConfig {
    fn default() -> Self {
        Self {
            chance: 0.2,
            step: 0.1,
        }
    }
}

impl MutationConfig {
    pub fn from_config(config: &crate::config::EvolutionConfig) -> Self {
        Self {
            chance: config.mutation_chance,
            step: config.mutation_step,
        }
    }

    /// Draw once against `chance`: a mutated copy or an exact copy of `parent`
    pub fn offspring_genome<R: Rng + ?Sized>(&self, parent: &Genome, rng: &mut R) -> Genome {
        if rng.gen::<f32>() < self.chance {
            parent.mutated(self.step, rng)
        } else {
            parent.clone()
        }
    }
}

impl Genome {
    /// Perturb every weight: `w' = clamp(w + (u - 0.5) * step, -1, 1)`
    pub fn mutate<R: Rng + ?Sized>(&mut self, step: f32, rng: &mut R) {
        for w in self.weights_mut() {
            let delta = (rng.gen::<f32>() - 0.5) * step;
            *w = (*w + delta).clamp(-1.0, 1.0);
        }
    }

    /// Mutated copy
    pub fn mutated<R: Rng + ?Sized>(&self, step: f32, rng: &mut R) -> Genome {
        let mut child = self.clone();
        child.mutate(step, rng);
        child
    }
}
