//! Random propagation delay.
//!
//! Draws each delay (in seconds) from a configured distribution, ignoring the
//! endpoints entirely. Useful to abstract the channel away in tests and
//! protocol studies; it is not a physical model.

use rand::SeedableRng;
use rand::distributions::Uniform;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Exp, Normal};
use serde::Deserialize;
use std::time::Duration;

use crate::error::{ConfigError, DelayError};

/// Stream used until `assign_streams` is called.
const DEFAULT_STREAM: u64 = 1;

/// Distribution of the delay in seconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RandomVariable {
    /// Always the same value.
    Constant { value: f64 },
    /// Uniform over `[min, max)`.
    Uniform { min: f64, max: f64 },
    /// Exponential with the given mean.
    Exponential { mean: f64 },
    /// Normal; negative draws are reported as errors, not clamped.
    Normal { mean: f64, std_dev: f64 },
}

impl Default for RandomVariable {
    fn default() -> Self {
        RandomVariable::Uniform { min: 0.0, max: 1.0 }
    }
}

/// Pre-built sampler so parameters are validated once.
#[derive(Debug, Clone)]
enum Sampler {
    Constant(f64),
    Uniform(Uniform<f64>),
    Exponential(Exp<f64>),
    Normal(Normal<f64>),
}

impl Sampler {
    fn build(variable: &RandomVariable) -> Result<Self, ConfigError> {
        match *variable {
            RandomVariable::Constant { value } => {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::Invalid(format!("constant delay must be a non-negative number, got {}", value)));
                }
                Ok(Sampler::Constant(value))
            }
            RandomVariable::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || min < 0.0 || min >= max {
                    return Err(ConfigError::Invalid(format!("uniform delay needs 0 <= min < max, got [{}, {})", min, max)));
                }
                Ok(Sampler::Uniform(Uniform::new(min, max)))
            }
            RandomVariable::Exponential { mean } => {
                if !mean.is_finite() || mean <= 0.0 {
                    return Err(ConfigError::Invalid(format!("exponential delay needs a positive mean, got {}", mean)));
                }
                let exp = Exp::new(1.0 / mean).map_err(|e| ConfigError::Invalid(format!("exponential delay: {}", e)))?;
                Ok(Sampler::Exponential(exp))
            }
            RandomVariable::Normal { mean, std_dev } => {
                if !mean.is_finite() {
                    return Err(ConfigError::Invalid(format!("normal delay needs a finite mean, got {}", mean)));
                }
                if !std_dev.is_finite() || std_dev < 0.0 {
                    return Err(ConfigError::Invalid(format!("normal delay needs std_dev >= 0, got {}", std_dev)));
                }
                let normal = Normal::new(mean, std_dev).map_err(|e| ConfigError::Invalid(format!("normal delay: {}", e)))?;
                Ok(Sampler::Normal(normal))
            }
        }
    }

    fn sample(&self, rng: &mut ChaCha8Rng) -> f64 {
        match self {
            Sampler::Constant(value) => *value,
            Sampler::Uniform(dist) => dist.sample(rng),
            Sampler::Exponential(dist) => dist.sample(rng),
            Sampler::Normal(dist) => dist.sample(rng),
        }
    }
}

/// Delay model drawing from an owned, seedable stream.
#[derive(Debug, Clone)]
pub struct RandomDelayModel {
    variable: RandomVariable,
    sampler: Sampler,
    rng: ChaCha8Rng,
}

impl RandomDelayModel {
    pub fn new(variable: RandomVariable) -> Result<Self, ConfigError> {
        let sampler = Sampler::build(&variable)?;
        Ok(Self {
            variable,
            sampler,
            rng: ChaCha8Rng::seed_from_u64(DEFAULT_STREAM),
        })
    }

    pub fn variable(&self) -> &RandomVariable {
        &self.variable
    }

    /// Draw the next delay. Advances the stream.
    pub fn get_delay(&mut self) -> Result<Duration, DelayError> {
        let seconds = self.sampler.sample(&mut self.rng);
        Duration::try_from_secs_f64(seconds).map_err(|_| DelayError::InvalidDelay(seconds))
    }

    /// Restart the stream from `stream`. Returns the number of streams used.
    pub fn assign_streams(&mut self, stream: i64) -> i64 {
        self.rng = ChaCha8Rng::seed_from_u64(stream as u64);
        1
    }
}
