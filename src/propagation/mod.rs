//! Propagation delay models.
//!
//! ## Module Organization
//!
//! - `geometry`: vectors and distances
//! - `delay_model`: the `DelayModel` family and its configuration
//! - `random`: delays drawn from a seedable distribution
//! - `constant_speed`: distance over speed, optionally bridged to a channel service

pub mod constant_speed;
pub mod delay_model;
pub mod geometry;
pub mod random;

pub use constant_speed::{ConstantSpeedDelayModel, SPEED_OF_LIGHT};
pub use delay_model::{DelayModel, DelayModelConfig};
pub use geometry::Vector3;
pub use random::{RandomDelayModel, RandomVariable};
