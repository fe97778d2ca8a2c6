//! Command type definitions for the channel service protocol.

use serde::{Deserialize, Serialize};

use crate::propagation::geometry::Vector3;

/// Name of an endpoint's twin inside the channel service.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectId(String);

impl ObjectId {
    /// Twin names are one-based: node 0 is `obj1`.
    pub fn from_node_id(node_id: u32) -> Self {
        ObjectId(format!("obj{}", u64::from(node_id) + 1))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Commands that can be sent to the channel service.
#[derive(Debug, Clone)]
pub enum ChannelCommand {
    /// Move an object's twin. Idempotent; must precede delay queries naming it.
    UpdateLocation { id: ObjectId, position: Vector3, velocity: Vector3 },

    /// Ask for the propagation delay between two twins.
    PropagationDelay { a: ObjectId, b: ObjectId },

    /// Let the service release the scene at the end of a run.
    Shutdown,
}

/// JSON payload structure for the `/command` endpoint.
#[derive(Debug, Serialize)]
pub struct CommandPayload {
    pub command: String,
    pub parameters: serde_json::Value,
}

/// Reply to a `propagation_delay` command.
#[derive(Debug, Deserialize)]
pub struct DelayReply {
    /// Delay in seconds; exactly zero means no measurement is available.
    pub delay: f64,
}

impl ChannelCommand {
    /// Convert the command to a JSON payload for the channel service.
    pub fn to_payload(&self) -> CommandPayload {
        match self {
            ChannelCommand::UpdateLocation { id, position, velocity } => CommandPayload {
                command: "update_location".to_string(),
                parameters: serde_json::json!({
                    "id": id.as_str(),
                    "position": position,
                    "velocity": velocity,
                }),
            },

            ChannelCommand::PropagationDelay { a, b } => CommandPayload {
                command: "propagation_delay".to_string(),
                parameters: serde_json::json!({
                    "a": a.as_str(),
                    "b": b.as_str(),
                }),
            },

            ChannelCommand::Shutdown => CommandPayload {
                command: "shutdown".to_string(),
                parameters: serde_json::json!({}),
            },
        }
    }
}
