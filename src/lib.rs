//! Propagation delay engine for discrete-event network simulation.
//!
//! - `propagation`: the `DelayModel` family (random, constant speed)
//! - `bridge`: session with an external channel simulator that can replace the
//!   constant-speed baseline
//! - `progress`: baseline/external comparison records
//! - `mobility`: endpoint kinematics read by the models
//! - `scenario`: a small base station + UE scenario driving the models

pub mod bridge;
pub mod error;
pub mod mobility;
pub mod progress;
pub mod propagation;
pub mod scenario;

pub use error::{BridgeError, ConfigError, DelayError};
