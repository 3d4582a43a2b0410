//! Arbitrator: repeated provider lookups until one provider qualifies or time runs out

use crate::strategy::filter_on_change;
use crate::{
    ArbitrationConfig, ArbitrationListener, ArbitrationStatus, CapabilitiesLookup, DiscoveryQos,
};
use router_api::{ArbitrationResult, CapabilityEntry};
use router_core::{CoreError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Arbitrator selects one provider for a domain/interface pair.
///
/// Each instance runs a single arbitration: `Created -> Running ->
/// {Successful | CanceledForever}`. Polling happens on its own task and ends
/// only when a terminal state is reached.
pub struct Arbitrator {
    domain: String,
    interface_name: String,
    discovery_qos: DiscoveryQos,
    capabilities_source: Arc<dyn CapabilitiesLookup>,
    config: ArbitrationConfig,
    listener: Option<Arc<dyn ArbitrationListener>>,
    started: AtomicBool,
}

impl Arbitrator {
    /// Create an arbitrator with the default polling configuration
    pub fn new(
        domain: impl Into<String>,
        interface_name: impl Into<String>,
        discovery_qos: DiscoveryQos,
        capabilities_source: Arc<dyn CapabilitiesLookup>,
    ) -> Self {
        Self {
            domain: domain.into(),
            interface_name: interface_name.into(),
            discovery_qos,
            capabilities_source,
            config: ArbitrationConfig::default(),
            listener: None,
            started: AtomicBool::new(false),
        }
    }

    /// Override the polling configuration
    pub fn with_config(mut self, config: ArbitrationConfig) -> Self {
        self.config = config;
        self
    }

    /// Register the listener; must happen before `start_arbitration`
    pub fn set_arbitration_listener(&mut self, listener: Arc<dyn ArbitrationListener>) {
        self.listener = Some(listener);
    }

    pub fn discovery_qos(&self) -> &DiscoveryQos {
        &self.discovery_qos
    }

    /// Start polling in the background and return immediately.
    ///
    /// Must be called from within a tokio runtime. Fails when called twice,
    /// when no listener is set or when the polling configuration is invalid.
    pub fn start_arbitration(&self) -> Result<JoinHandle<()>> {
        let listener = self.listener.clone().ok_or(CoreError::ListenerNotSet)?;
        self.config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| CoreError::Internal(format!("no tokio runtime available: {}", e)))?;

        if self.started.swap(true, Ordering::SeqCst) {
            return Err(CoreError::ArbitrationAlreadyStarted);
        }

        debug!(
            "Starting arbitration for {}/{} with {:?}",
            self.domain, self.interface_name, self.discovery_qos.arbitration_strategy
        );

        let poll = PollLoop {
            domain: self.domain.clone(),
            interface_name: self.interface_name.clone(),
            discovery_qos: self.discovery_qos.clone(),
            capabilities_source: self.capabilities_source.clone(),
            config: self.config.clone(),
            listener,
        };
        Ok(runtime.spawn(poll.run()))
    }
}

/// Apply the on-change filter and then the strategy of the DiscoveryQos
pub fn select_provider(
    discovery_qos: &DiscoveryQos,
    candidates: Vec<CapabilityEntry>,
) -> Option<CapabilityEntry> {
    let filtered = filter_on_change(candidates, discovery_qos.provider_must_support_on_change);
    discovery_qos
        .arbitration_strategy
        .select(&discovery_qos.custom_parameters, &filtered)
}

struct PollLoop {
    domain: String,
    interface_name: String,
    discovery_qos: DiscoveryQos,
    capabilities_source: Arc<dyn CapabilitiesLookup>,
    config: ArbitrationConfig,
    listener: Arc<dyn ArbitrationListener>,
}

impl PollLoop {
    async fn run(self) {
        let started_at = Instant::now();
        let timeout = self.discovery_qos.timeout();

        // First tick completes immediately
        let mut ticker = time::interval(self.config.retry_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut attempt: u32 = 0;

        loop {
            ticker.tick().await;
            attempt += 1;
            self.listener.notify_status_changed(ArbitrationStatus::Running);

            let bound = self.lookup_bound(timeout, started_at.elapsed());
            let candidates = self.lookup_candidates(attempt, bound).await;
            if let Some(selected) = select_provider(&self.discovery_qos, candidates) {
                info!(
                    "Arbitration for {}/{} selected participant {} after {} attempt(s)",
                    self.domain, self.interface_name, selected.participant_id, attempt
                );
                self.listener.set_arbitration_result(
                    ArbitrationStatus::Successful,
                    ArbitrationResult::from(&selected),
                );
                return;
            }

            if timeout.is_zero() || started_at.elapsed() >= timeout {
                let error = CoreError::NoCompatibleProviderFound {
                    domain: self.domain.clone(),
                    interface_name: self.interface_name.clone(),
                };
                warn!("{} after {} attempt(s)", error, attempt);
                self.listener
                    .notify_status_changed(ArbitrationStatus::CanceledForever);
                return;
            }

            debug!(
                "No provider qualified for {}/{} in attempt {}, retrying in {:?}",
                self.domain, self.interface_name, attempt, self.config.retry_interval
            );
        }
    }

    /// How long a single lookup may take. A lookup never outlives the
    /// arbitration timeout; a zero timeout gets one attempt of `lookup_timeout`.
    fn lookup_bound(&self, timeout: Duration, elapsed: Duration) -> Duration {
        if timeout.is_zero() {
            return self.config.lookup_timeout;
        }
        self.config
            .lookup_timeout
            .min(timeout.saturating_sub(elapsed))
    }

    /// Lookup failures and slow lookups count as an empty candidate set
    async fn lookup_candidates(&self, attempt: u32, bound: Duration) -> Vec<CapabilityEntry> {
        let lookup = self.capabilities_source.lookup(
            &self.domain,
            &self.interface_name,
            &self.discovery_qos,
        );

        match time::timeout(bound, lookup).await {
            Ok(Ok(candidates)) => {
                debug!(
                    "Attempt {} for {}/{} returned {} candidate(s)",
                    attempt,
                    self.domain,
                    self.interface_name,
                    candidates.len()
                );
                candidates
            }
            Ok(Err(e)) => {
                warn!(
                    "Attempt {} for {}/{}: lookup error: {}",
                    attempt, self.domain, self.interface_name, e
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    "Attempt {} for {}/{}: lookup timeout after {:?}",
                    attempt, self.domain, self.interface_name, bound
                );
                Vec::new()
            }
        }
    }
}
