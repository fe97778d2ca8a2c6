//! Bridge to an external channel simulator.
//!
//! When enabled, delay queries push the endpoints' kinematics to the service
//! and substitute its propagation delay for the local baseline.

pub mod client;
pub mod command;
pub mod config;
#[cfg(test)]
pub(crate) mod fake;
pub mod session;

pub use client::{ChannelService, HttpChannelService};
pub use command::{ChannelCommand, CommandPayload, ObjectId};
pub use config::{BridgeConfig, SentinelPolicy};
pub use session::{BridgeHandle, BridgeState, ChannelBridge};
