//! Scripted channel service for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use super::client::ChannelService;
use super::command::ObjectId;
use crate::error::BridgeError;
use crate::propagation::geometry::Vector3;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Update(String, Vector3, Vector3),
    Delay(String, String),
    Shutdown,
}

/// Answers delay queries from a script (falling back to `default_delay`) and
/// records every call in a shared list.
pub(crate) struct FakeService {
    pub(crate) calls: Arc<Mutex<Vec<Call>>>,
    pub(crate) delays: VecDeque<Result<f64, BridgeError>>,
    pub(crate) default_delay: f64,
    pub(crate) fail_updates: bool,
}

impl FakeService {
    pub(crate) fn answering(delay: f64) -> (Self, Arc<Mutex<Vec<Call>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let service = Self {
            calls: Arc::clone(&calls),
            delays: VecDeque::new(),
            default_delay: delay,
            fail_updates: false,
        };
        (service, calls)
    }
}

impl ChannelService for FakeService {
    fn update_location(&mut self, id: &ObjectId, position: Vector3, velocity: Vector3) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(Call::Update(id.to_string(), position, velocity));
        if self.fail_updates {
            return Err(BridgeError::Status {
                status: 503,
                body: "busy".to_string(),
            });
        }
        Ok(())
    }

    fn propagation_delay(&mut self, a: &ObjectId, b: &ObjectId) -> Result<f64, BridgeError> {
        self.calls.lock().unwrap().push(Call::Delay(a.to_string(), b.to_string()));
        self.delays.pop_front().unwrap_or(Ok(self.default_delay))
    }

    fn shutdown(&mut self) -> Result<(), BridgeError> {
        self.calls.lock().unwrap().push(Call::Shutdown);
        Ok(())
    }
}
