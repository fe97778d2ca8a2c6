//! Bridge session between the delay models and the channel service.
//!
//! One bridge exists per simulation run. It is configured once before the run,
//! becomes active on the first routed query and is shut down explicitly at the
//! end:
//!
//! ```text
//! Uninitialized -> Configured -> Active -> ShutDown
//! ```
//!
//! Queries are strictly sequential and block on the service. Soft failures
//! (a lost location update, a failed delay fetch) never close the session; a
//! failed fetch reads as the zero sentinel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::client::{ChannelService, HttpChannelService};
use super::command::ObjectId;
use super::config::{BridgeConfig, SentinelPolicy};
use crate::error::{BridgeError, DelayError, EndpointSide};
use crate::mobility::Mobility;
use crate::progress::{DELAY_COMPARISON_CHANNEL, ProgressLog, comparison_payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Uninitialized,
    Configured,
    Active,
    ShutDown,
}

pub struct ChannelBridge {
    state: BridgeState,
    config: BridgeConfig,
    service: Option<Box<dyn ChannelService>>,
    progress: ProgressLog,
}

impl Default for ChannelBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelBridge {
    pub fn new() -> Self {
        Self {
            state: BridgeState::Uninitialized,
            config: BridgeConfig::default(),
            service: None,
            progress: ProgressLog::in_memory(),
        }
    }

    /// Configure the bridge, connecting to the HTTP channel service if enabled.
    pub fn configure(&mut self, config: BridgeConfig) -> Result<(), BridgeError> {
        self.check_configurable()?;
        let service: Option<Box<dyn ChannelService>> = if config.enabled {
            Some(Box::new(HttpChannelService::new(&config)?))
        } else {
            None
        };
        self.install(config, service)
    }

    /// Configure the bridge with a caller-provided transport. The transport is
    /// only kept when `config.enabled` is set.
    pub fn configure_with_service(&mut self, config: BridgeConfig, service: Box<dyn ChannelService>) -> Result<(), BridgeError> {
        self.check_configurable()?;
        let service = config.enabled.then_some(service);
        self.install(config, service)
    }

    fn check_configurable(&self) -> Result<(), BridgeError> {
        match self.state {
            BridgeState::Uninitialized => Ok(()),
            BridgeState::ShutDown => Err(BridgeError::ShutDown),
            BridgeState::Configured | BridgeState::Active => Err(BridgeError::AlreadyConfigured),
        }
    }

    fn install(&mut self, config: BridgeConfig, service: Option<Box<dyn ChannelService>>) -> Result<(), BridgeError> {
        if let Some(path) = &config.progress_log {
            self.progress = ProgressLog::with_file(path)?;
        }
        if config.enabled {
            log::info!(
                "Channel bridge enabled: {} (local: {}, verbose: {}, sentinel: {:?})",
                config.service_url(),
                config.local_machine,
                config.verbose,
                config.sentinel_policy
            );
        } else {
            log::info!("Channel bridge disabled; using local delay models");
        }
        self.config = config;
        self.service = service;
        self.state = BridgeState::Configured;
        Ok(())
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn progress(&self) -> &ProgressLog {
        &self.progress
    }

    pub fn progress_mut(&mut self) -> &mut ProgressLog {
        &mut self.progress
    }

    /// Whether routed queries reach the channel service. Errors outside the
    /// configured lifetime.
    pub fn is_enabled(&self) -> Result<bool, BridgeError> {
        match self.state {
            BridgeState::Uninitialized => Err(BridgeError::NotConfigured),
            BridgeState::ShutDown => Err(BridgeError::ShutDown),
            BridgeState::Configured | BridgeState::Active => Ok(self.service.is_some()),
        }
    }

    /// Route one delay query through the channel service.
    ///
    /// `baseline_secs` is the local constant-speed delay. It is returned as-is
    /// when the bridge is disabled, and it is the reference value in
    /// comparison records.
    pub fn exchange(&mut self, a: &dyn Mobility, b: &dyn Mobility, baseline_secs: f64) -> Result<f64, DelayError> {
        if !self.is_enabled()? {
            return Ok(baseline_secs);
        }
        let Some(service) = self.service.as_mut() else {
            return Ok(baseline_secs);
        };

        // Both identities are resolved before any traffic.
        let a_id = resolve_identity(a, EndpointSide::A)?;
        let b_id = resolve_identity(b, EndpointSide::B)?;

        if self.state == BridgeState::Configured {
            log::debug!("Channel bridge active");
            self.state = BridgeState::Active;
        }

        for (id, endpoint) in [(&a_id, a), (&b_id, b)] {
            if let Err(e) = service.update_location(id, endpoint.position(), endpoint.velocity()) {
                log::warn!("Location update for {} failed: {}", id, e);
            }
        }

        let external_secs = match service.propagation_delay(&a_id, &b_id) {
            Ok(delay) => delay,
            Err(e) => {
                log::warn!("Delay query {} -> {} failed: {}", a_id, b_id, e);
                0.0
            }
        };

        if !external_secs.is_finite() || external_secs < 0.0 {
            return Err(DelayError::InvalidDelay(external_secs));
        }

        if external_secs == 0.0 {
            log::debug!("No external measurement for {} -> {}", a_id, b_id);
            return Ok(match self.config.sentinel_policy {
                SentinelPolicy::PassThrough => 0.0,
                SentinelPolicy::FallbackToBaseline => baseline_secs,
            });
        }

        if self.config.verbose {
            let baseline_ms = baseline_secs * 1000.0;
            let external_ms = external_secs * 1000.0;
            log::info!("ns_ms: {:.6}, external_ms: {:.6}", baseline_ms, external_ms);
            self.progress.log(DELAY_COMPARISON_CHANNEL, comparison_payload(baseline_ms, external_ms));
        }

        Ok(external_secs)
    }

    /// End the session. Terminal: the bridge cannot be configured or queried
    /// afterwards.
    pub fn shutdown(&mut self) -> Result<(), BridgeError> {
        if self.state == BridgeState::ShutDown {
            return Err(BridgeError::ShutDown);
        }
        if let Some(mut service) = self.service.take() {
            match service.shutdown() {
                Ok(()) => log::info!("Channel service shut down"),
                Err(e) => log::warn!("Channel service shutdown failed: {}", e),
            }
        }
        self.state = BridgeState::ShutDown;
        self.progress.flush()?;
        Ok(())
    }
}

fn resolve_identity(endpoint: &dyn Mobility, side: EndpointSide) -> Result<ObjectId, DelayError> {
    match endpoint.node_id() {
        Some(node_id) => Ok(ObjectId::from_node_id(node_id)),
        None => {
            log::error!("Endpoint {} is not linked to a node", side);
            Err(DelayError::MissingIdentity(side))
        }
    }
}

/// Shared handle to the run's bridge.
#[derive(Clone, Default)]
pub struct BridgeHandle(Arc<Mutex<ChannelBridge>>);

impl BridgeHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the bridge, recovering a poisoned lock.
    pub fn lock(&self) -> MutexGuard<'_, ChannelBridge> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn configure(&self, config: BridgeConfig) -> Result<(), BridgeError> {
        self.lock().configure(config)
    }

    pub fn configure_with_service(&self, config: BridgeConfig, service: Box<dyn ChannelService>) -> Result<(), BridgeError> {
        self.lock().configure_with_service(config, service)
    }

    pub fn shutdown(&self) -> Result<(), BridgeError> {
        self.lock().shutdown()
    }

    pub fn state(&self) -> BridgeState {
        self.lock().state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::fake::{Call, FakeService};
    use crate::mobility::MobilityState;
    use crate::progress::ProgressRecord;
    use crate::propagation::geometry::Vector3;

    fn enabled(verbose: bool) -> BridgeConfig {
        BridgeConfig {
            enabled: true,
            verbose,
            ..BridgeConfig::default()
        }
    }

    fn endpoints() -> (MobilityState, MobilityState) {
        (
            MobilityState::new(0, Vector3::new(0.0, 0.0, 10.0), Vector3::ZERO),
            MobilityState::new(4, Vector3::new(30.0, 40.0, 1.5), Vector3::new(1.0, 2.0, 0.0)),
        )
    }

    fn payloads(bridge: &ChannelBridge) -> Vec<String> {
        bridge.progress().records().map(|r: &ProgressRecord| r.payload.clone()).collect()
    }

    #[test]
    fn lifecycle_transitions() {
        let (service, _) = FakeService::answering(0.001);
        let mut bridge = ChannelBridge::new();
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
        bridge.configure_with_service(enabled(false), Box::new(service)).unwrap();
        assert_eq!(bridge.state(), BridgeState::Configured);

        let (a, b) = endpoints();
        bridge.exchange(&a, &b, 0.0005).unwrap();
        assert_eq!(bridge.state(), BridgeState::Active);

        bridge.shutdown().unwrap();
        assert_eq!(bridge.state(), BridgeState::ShutDown);
    }

    #[test]
    fn query_before_configuration_is_rejected() {
        let mut bridge = ChannelBridge::new();
        let (a, b) = endpoints();
        assert!(matches!(bridge.exchange(&a, &b, 0.1), Err(DelayError::Bridge(BridgeError::NotConfigured))));
    }

    #[test]
    fn query_after_shutdown_is_rejected() {
        let (service, calls) = FakeService::answering(0.001);
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(false), Box::new(service)).unwrap();
        bridge.shutdown().unwrap();

        let (a, b) = endpoints();
        assert!(matches!(bridge.exchange(&a, &b, 0.1), Err(DelayError::Bridge(BridgeError::ShutDown))));
        assert!(matches!(bridge.shutdown(), Err(BridgeError::ShutDown)));
        assert_eq!(*calls.lock().unwrap(), vec![Call::Shutdown]);
    }

    #[test]
    fn reconfiguration_is_rejected() {
        let mut bridge = ChannelBridge::new();
        bridge.configure(BridgeConfig::default()).unwrap();
        assert!(matches!(bridge.configure(BridgeConfig::default()), Err(BridgeError::AlreadyConfigured)));
        bridge.shutdown().unwrap();
        assert!(matches!(bridge.configure(BridgeConfig::default()), Err(BridgeError::ShutDown)));
    }

    #[test]
    fn disabled_bridge_returns_baseline_without_traffic() {
        let (service, calls) = FakeService::answering(0.002);
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(BridgeConfig::default(), Box::new(service)).unwrap();

        let detached = MobilityState::detached(Vector3::ZERO, Vector3::ZERO);
        assert_eq!(bridge.exchange(&detached, &detached, 0.25).unwrap(), 0.25);
        assert_eq!(bridge.state(), BridgeState::Configured);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn updates_precede_query_in_order() {
        let (service, calls) = FakeService::answering(0.002);
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(false), Box::new(service)).unwrap();

        let (a, b) = endpoints();
        assert_eq!(bridge.exchange(&a, &b, 0.0015).unwrap(), 0.002);
        assert_eq!(
            *calls.lock().unwrap(),
            vec![
                Call::Update("obj1".to_string(), a.position, a.velocity),
                Call::Update("obj5".to_string(), b.position, b.velocity),
                Call::Delay("obj1".to_string(), "obj5".to_string()),
            ]
        );
    }

    #[test]
    fn verbose_records_baseline_and_external_in_ms() {
        let (service, _) = FakeService::answering(0.002);
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(true), Box::new(service)).unwrap();

        let (a, b) = endpoints();
        assert_eq!(bridge.exchange(&a, &b, 0.0015).unwrap(), 0.002);
        assert_eq!(payloads(&bridge), vec!["1.500000,2.000000".to_string()]);
        assert_eq!(bridge.progress().records().next().unwrap().channel, 0);
    }

    #[test]
    fn quiet_bridge_does_not_record() {
        let (service, _) = FakeService::answering(0.002);
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(false), Box::new(service)).unwrap();

        let (a, b) = endpoints();
        bridge.exchange(&a, &b, 0.0015).unwrap();
        assert!(bridge.progress().is_empty());
    }

    #[test]
    fn zero_sentinel_passes_through_without_record() {
        let (service, _) = FakeService::answering(0.0);
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(true), Box::new(service)).unwrap();

        let (a, b) = endpoints();
        assert_eq!(bridge.exchange(&a, &b, 0.0015).unwrap(), 0.0);
        assert!(bridge.progress().is_empty());
    }

    #[test]
    fn zero_sentinel_can_fall_back_to_baseline() {
        let (service, _) = FakeService::answering(0.0);
        let mut bridge = ChannelBridge::new();
        let config = BridgeConfig {
            sentinel_policy: SentinelPolicy::FallbackToBaseline,
            ..enabled(true)
        };
        bridge.configure_with_service(config, Box::new(service)).unwrap();

        let (a, b) = endpoints();
        assert_eq!(bridge.exchange(&a, &b, 0.0015).unwrap(), 0.0015);
        assert!(bridge.progress().is_empty());
    }

    #[test]
    fn failed_fetch_degrades_to_sentinel_and_keeps_session() {
        let (mut service, calls) = FakeService::answering(0.003);
        service.delays.push_back(Err(BridgeError::InvalidReply("garbled".to_string())));
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(true), Box::new(service)).unwrap();

        let (a, b) = endpoints();
        assert_eq!(bridge.exchange(&a, &b, 0.0015).unwrap(), 0.0);
        assert_eq!(bridge.exchange(&a, &b, 0.0015).unwrap(), 0.003);
        assert_eq!(bridge.state(), BridgeState::Active);
        assert_eq!(calls.lock().unwrap().len(), 6);
    }

    #[test]
    fn failed_location_update_does_not_abort_query() {
        let (mut service, _) = FakeService::answering(0.002);
        service.fail_updates = true;
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(false), Box::new(service)).unwrap();

        let (a, b) = endpoints();
        assert_eq!(bridge.exchange(&a, &b, 0.0015).unwrap(), 0.002);
    }

    #[test]
    fn missing_identity_aborts_before_any_call() {
        let (service, calls) = FakeService::answering(0.002);
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(true), Box::new(service)).unwrap();

        let (a, _) = endpoints();
        let detached = MobilityState::detached(Vector3::new(1.0, 1.0, 1.0), Vector3::ZERO);
        assert!(matches!(bridge.exchange(&a, &detached, 0.1), Err(DelayError::MissingIdentity(EndpointSide::B))));
        assert!(matches!(bridge.exchange(&detached, &a, 0.1), Err(DelayError::MissingIdentity(EndpointSide::A))));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn negative_external_delay_is_rejected() {
        let (service, _) = FakeService::answering(-0.5);
        let mut bridge = ChannelBridge::new();
        bridge.configure_with_service(enabled(true), Box::new(service)).unwrap();

        let (a, b) = endpoints();
        assert!(matches!(bridge.exchange(&a, &b, 0.1), Err(DelayError::InvalidDelay(v)) if v == -0.5));
    }

    #[test]
    fn handle_shares_one_session() {
        let handle = BridgeHandle::new();
        let other = handle.clone();
        handle.configure(BridgeConfig::default()).unwrap();
        assert_eq!(other.state(), BridgeState::Configured);
        other.shutdown().unwrap();
        assert_eq!(handle.state(), BridgeState::ShutDown);
    }
}
