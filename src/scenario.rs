//! Scenario loading, validation and the stepping loop.
//!
//! A scenario places one static base station (node 0) in the middle of a
//! square area and a number of user equipments (nodes 1..) at random
//! positions, each moving at a random constant speed and heading and bouncing
//! off the area's edges. Every step the downlink delay from the base station
//! to each UE is queried from the delay model.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use std::f64::consts::TAU;
use std::path::Path;
use std::time::Duration;

use crate::bridge::BridgeConfig;
use crate::error::{ConfigError, DelayError};
use crate::mobility::{Bounds, ConstantVelocityMobility, Mobility, MobilityState};
use crate::propagation::{DelayModel, DelayModelConfig, Vector3};

const MAX_UES: usize = 10000;
const BASE_STATION_HEIGHT: f64 = 30.0;
const UE_HEIGHT: f64 = 1.5;

/// Root structure of a scenario file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ScenarioConfig {
    /// Seed for placement and for the delay model's streams.
    pub seed: u64,
    /// Simulated time to run (s).
    pub duration_secs: f64,
    /// Interval between delay queries (s).
    pub step_secs: f64,
    pub ue_count: usize,
    /// Side of the square deployment area (m).
    pub area_side: f64,
    /// UE speed range (m/s).
    pub min_speed: f64,
    pub max_speed: f64,
    pub delay: DelayModelConfig,
    pub bridge: BridgeConfig,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 1,
            duration_secs: 2.0,
            step_secs: 0.1,
            ue_count: 3,
            area_side: 100.0,
            min_speed: 1.0,
            max_speed: 5.0,
            delay: DelayModelConfig::default(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl ScenarioConfig {
    /// Load a scenario from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the scenario file
    ///
    /// # Returns
    /// * `Ok(ScenarioConfig)` with defaults filled in for missing keys
    /// * `Err(ConfigError)` if the file cannot be read, parsed or validated
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ScenarioConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject scenarios that would make the stepping loop meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ue_count == 0 {
            return Err(ConfigError::Invalid("scenario must contain at least one UE".to_string()));
        }
        if self.ue_count > MAX_UES {
            return Err(ConfigError::Invalid(format!("UE count {} exceeds maximum of {}", self.ue_count, MAX_UES)));
        }
        if !(self.step_secs > 0.0 && self.step_secs.is_finite()) {
            return Err(ConfigError::Invalid(format!("step must be positive, got {} s", self.step_secs)));
        }
        if !(self.duration_secs >= 0.0 && self.duration_secs.is_finite()) {
            return Err(ConfigError::Invalid(format!("duration must be non-negative, got {} s", self.duration_secs)));
        }
        if !(self.area_side > 0.0 && self.area_side.is_finite()) {
            return Err(ConfigError::Invalid(format!("area side must be positive, got {} m", self.area_side)));
        }
        if !(self.min_speed >= 0.0 && self.min_speed <= self.max_speed && self.max_speed.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "speed range must satisfy 0 <= min <= max, got [{}, {}] m/s",
                self.min_speed, self.max_speed
            )));
        }
        Ok(())
    }
}

/// Outcome of a scenario run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioReport {
    pub queries: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub total_delay: Duration,
}

impl ScenarioReport {
    fn record(&mut self, delay: Duration) {
        if self.queries == 0 || delay < self.min_delay {
            self.min_delay = delay;
        }
        self.max_delay = self.max_delay.max(delay);
        self.total_delay += delay;
        self.queries += 1;
    }

    pub fn mean_delay(&self) -> Duration {
        if self.queries == 0 {
            return Duration::ZERO;
        }
        self.total_delay.div_f64(self.queries as f64)
    }
}

impl std::fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} delay queries, min {:?}, mean {:?}, max {:?}",
            self.queries,
            self.min_delay,
            self.mean_delay(),
            self.max_delay
        )
    }
}

pub struct Scenario {
    base_station: MobilityState,
    ues: Vec<ConstantVelocityMobility>,
    steps: usize,
    step_secs: f64,
}

impl Scenario {
    /// Lay out the base station and UEs.
    ///
    /// # Arguments
    /// * `config` - A validated scenario; `seed` drives UE placement, speed
    ///   and heading
    pub fn new(config: &ScenarioConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let bounds = Bounds::square(config.area_side);
        let center = config.area_side / 2.0;
        let base_station = MobilityState::at(0, Vector3::new(center, center, BASE_STATION_HEIGHT));

        let ues = (1..=config.ue_count as u32)
            .map(|node_id| {
                let position = Vector3::new(rng.gen_range(0.0..=config.area_side), rng.gen_range(0.0..=config.area_side), UE_HEIGHT);
                let speed = rng.gen_range(config.min_speed..=config.max_speed);
                let heading = rng.gen_range(0.0..TAU);
                let velocity = Vector3::new(speed * heading.cos(), speed * heading.sin(), 0.0);
                log::debug!("UE {} at ({:.2}, {:.2}) moving {:.2} m/s", node_id, position.x, position.y, speed);
                ConstantVelocityMobility::new(node_id, position, velocity, bounds)
            })
            .collect();

        Self {
            base_station,
            ues,
            steps: (config.duration_secs / config.step_secs).floor() as usize + 1,
            step_secs: config.step_secs,
        }
    }

    pub fn base_station(&self) -> &MobilityState {
        &self.base_station
    }

    pub fn ues(&self) -> &[ConstantVelocityMobility] {
        &self.ues
    }

    /// Query the downlink delay to every UE at every step, moving UEs between
    /// steps. Stops at the first delay error.
    pub fn run(&mut self, model: &mut DelayModel) -> Result<ScenarioReport, DelayError> {
        let mut report = ScenarioReport::default();
        for step in 0..self.steps {
            for ue in &self.ues {
                let delay = model.get_delay(&self.base_station, ue)?;
                log::trace!("t={:.3}s node {} -> {}: {:?}", step as f64 * self.step_secs, 0, ue.node_id().unwrap_or_default(), delay);
                report.record(delay);
            }
            for ue in &mut self.ues {
                ue.advance(self.step_secs);
            }
        }
        Ok(report)
    }
}
