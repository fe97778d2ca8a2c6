//! HTTP client for communicating with the channel service.

use reqwest::blocking::Client;

use super::command::{ChannelCommand, DelayReply, ObjectId};
use super::config::BridgeConfig;
use crate::error::BridgeError;
use crate::propagation::geometry::Vector3;

/// Transport to an external channel simulator.
///
/// Calls block until the service has answered. Implementations other than
/// [`HttpChannelService`] are mainly useful for tests and offline replays.
pub trait ChannelService: Send {
    /// Push an object's position and velocity. Returns once the update was sent.
    fn update_location(&mut self, id: &ObjectId, position: Vector3, velocity: Vector3) -> Result<(), BridgeError>;

    /// Propagation delay between two objects, in seconds.
    fn propagation_delay(&mut self, a: &ObjectId, b: &ObjectId) -> Result<f64, BridgeError>;

    /// Tell the service the run is over.
    fn shutdown(&mut self) -> Result<(), BridgeError>;
}

/// Channel service reached over JSON/HTTP.
pub struct HttpChannelService {
    client: Client,
    url: String,
}

impl HttpChannelService {
    /// Create a new client for the service described by `config`.
    ///
    /// # Arguments
    /// * `config` - Bridge settings; `local_machine` disables proxies and
    ///   `timeout_secs` bounds every request
    ///
    /// # Returns
    /// * `Ok(HttpChannelService)` once the HTTP client is built
    /// * `Err(BridgeError::Http)` if the client cannot be created
    pub fn new(config: &BridgeConfig) -> Result<Self, BridgeError> {
        let mut builder = Client::builder().timeout(config.timeout());
        if config.local_machine {
            builder = builder.no_proxy();
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            url: format!("{}/command", config.service_url()),
        })
    }

    /// Send a command to the channel service.
    ///
    /// # Returns
    /// * `Ok(body)` if the service accepted the command (HTTP 2xx)
    /// * `Err(BridgeError::Status)` with the status and body otherwise
    /// * `Err(BridgeError::Http)` if the request could not be sent
    fn send_command(&self, command: &ChannelCommand) -> Result<String, BridgeError> {
        let payload = command.to_payload();

        log::trace!("Sending command to {}: {:?}", self.url, payload);

        let response = self.client.post(&self.url).json(&payload).send()?;

        let status = response.status();
        let body = response.text().unwrap_or_default();
        if status.is_success() {
            Ok(body)
        } else {
            Err(BridgeError::Status { status: status.as_u16(), body })
        }
    }
}

impl ChannelService for HttpChannelService {
    fn update_location(&mut self, id: &ObjectId, position: Vector3, velocity: Vector3) -> Result<(), BridgeError> {
        self.send_command(&ChannelCommand::UpdateLocation {
            id: id.clone(),
            position,
            velocity,
        })
        .map(|_| ())
    }

    fn propagation_delay(&mut self, a: &ObjectId, b: &ObjectId) -> Result<f64, BridgeError> {
        let body = self.send_command(&ChannelCommand::PropagationDelay { a: a.clone(), b: b.clone() })?;
        let reply: DelayReply = serde_json::from_str(&body).map_err(|e| BridgeError::InvalidReply(format!("{}: {}", e, body)))?;
        Ok(reply.delay)
    }

    fn shutdown(&mut self) -> Result<(), BridgeError> {
        self.send_command(&ChannelCommand::Shutdown).map(|_| ())
    }
}
