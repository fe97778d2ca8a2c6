//! Constant-speed propagation delay.
//!
//! The physics baseline: straight-line distance divided by the propagation
//! speed of the medium. When a bridge is attached and enabled, the baseline is
//! handed to the channel service exchange and the service's delay is returned
//! instead.

use std::time::Duration;

use super::geometry::distance;
use crate::bridge::BridgeHandle;
use crate::error::{ConfigError, DelayError, EndpointSide};
use crate::mobility::Mobility;

/// Propagation speed of light in vacuum (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

#[derive(Clone)]
pub struct ConstantSpeedDelayModel {
    speed: f64,
    bridge: Option<BridgeHandle>,
}

impl Default for ConstantSpeedDelayModel {
    fn default() -> Self {
        Self {
            speed: SPEED_OF_LIGHT,
            bridge: None,
        }
    }
}

impl ConstantSpeedDelayModel {
    pub fn new(speed: f64) -> Result<Self, ConfigError> {
        let mut model = Self::default();
        model.set_speed(speed)?;
        Ok(model)
    }

    /// Route queries through `bridge` (subject to its configuration).
    pub fn with_bridge(mut self, bridge: BridgeHandle) -> Self {
        self.bridge = Some(bridge);
        self
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(ConfigError::Invalid(format!("propagation speed must be positive, got {} m/s", speed)));
        }
        self.speed = speed;
        Ok(())
    }

    /// Local delay in seconds, independent of any bridge.
    pub fn baseline_secs(&self, a: &dyn Mobility, b: &dyn Mobility) -> Result<f64, DelayError> {
        let a_position = a.position();
        let b_position = b.position();
        if !a_position.is_finite() {
            return Err(DelayError::NonFinitePosition(EndpointSide::A));
        }
        if !b_position.is_finite() {
            return Err(DelayError::NonFinitePosition(EndpointSide::B));
        }
        Ok(distance(&a_position, &b_position) / self.speed)
    }

    pub fn get_delay(&self, a: &dyn Mobility, b: &dyn Mobility) -> Result<Duration, DelayError> {
        let baseline = self.baseline_secs(a, b)?;
        let seconds = match &self.bridge {
            Some(bridge) => bridge.lock().exchange(a, b, baseline)?,
            None => baseline,
        };
        Duration::try_from_secs_f64(seconds).map_err(|_| DelayError::InvalidDelay(seconds))
    }

    /// Deterministic model: uses no streams.
    pub fn assign_streams(&self, _stream: i64) -> i64 {
        0
    }
}
