//! The delay model family and its shared dispatch.

use serde::Deserialize;
use std::time::Duration;

use super::constant_speed::{ConstantSpeedDelayModel, SPEED_OF_LIGHT};
use super::random::{RandomDelayModel, RandomVariable};
use crate::bridge::BridgeHandle;
use crate::error::{ConfigError, DelayError};
use crate::mobility::Mobility;

/// Delay model selection as read from a scenario file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum DelayModelConfig {
    ConstantSpeed {
        #[serde(default = "default_speed")]
        speed: f64,
    },
    Random {
        #[serde(default)]
        variable: RandomVariable,
    },
}

fn default_speed() -> f64 {
    SPEED_OF_LIGHT
}

impl Default for DelayModelConfig {
    fn default() -> Self {
        DelayModelConfig::ConstantSpeed { speed: SPEED_OF_LIGHT }
    }
}

/// Propagation delay between two endpoints.
#[derive(Clone)]
pub enum DelayModel {
    Random(RandomDelayModel),
    ConstantSpeed(ConstantSpeedDelayModel),
}

impl DelayModel {
    /// Build a model from configuration. The bridge is only used by the
    /// constant-speed model.
    pub fn from_config(config: &DelayModelConfig, bridge: Option<BridgeHandle>) -> Result<Self, ConfigError> {
        match config {
            DelayModelConfig::ConstantSpeed { speed } => {
                let mut model = ConstantSpeedDelayModel::new(*speed)?;
                if let Some(bridge) = bridge {
                    model = model.with_bridge(bridge);
                }
                Ok(DelayModel::ConstantSpeed(model))
            }
            DelayModelConfig::Random { variable } => {
                if bridge.is_some() {
                    log::debug!("Random delay model ignores the channel bridge");
                }
                Ok(DelayModel::Random(RandomDelayModel::new(variable.clone())?))
            }
        }
    }

    /// Propagation delay from `a` to `b`. Never mutates the endpoints.
    pub fn get_delay(&mut self, a: &dyn Mobility, b: &dyn Mobility) -> Result<Duration, DelayError> {
        match self {
            DelayModel::Random(model) => model.get_delay(),
            DelayModel::ConstantSpeed(model) => model.get_delay(a, b),
        }
    }

    /// Assign deterministic streams starting at `stream`; returns how many
    /// were used.
    pub fn assign_streams(&mut self, stream: i64) -> i64 {
        match self {
            DelayModel::Random(model) => model.assign_streams(stream),
            DelayModel::ConstantSpeed(model) => model.assign_streams(stream),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DelayModel::Random(_) => "random",
            DelayModel::ConstantSpeed(_) => "constant-speed",
        }
    }
}
