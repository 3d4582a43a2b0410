//! Capabilities lookup used by arbitration

use crate::DiscoveryQos;
use router_api::CapabilityEntry;
use router_core::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Source of provider records for a domain/interface pair
#[async_trait::async_trait]
pub trait CapabilitiesLookup: Send + Sync {
    /// Look up all providers currently registered for the domain and interface
    async fn lookup(
        &self,
        domain: &str,
        interface_name: &str,
        discovery_qos: &DiscoveryQos,
    ) -> Result<Vec<CapabilityEntry>>;
}

/// In-memory capabilities directory.
///
/// Entries older than the DiscoveryQos cache max age are not returned.
#[derive(Clone, Default)]
pub struct StaticCapabilitiesDirectory {
    entries: Arc<RwLock<Vec<CapabilityEntry>>>,
}

impl StaticCapabilitiesDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding the given entries
    pub fn from_entries(entries: Vec<CapabilityEntry>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(entries)),
        }
    }

    /// Register or replace a provider entry (keyed by participant id)
    pub async fn add(&self, entry: CapabilityEntry) {
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.participant_id != entry.participant_id);
        debug!(
            "Registered capability {} for {}/{}",
            entry.participant_id, entry.domain, entry.interface_name
        );
        entries.push(entry);
    }

    /// Remove a provider entry
    pub async fn remove(&self, participant_id: &str) {
        let mut entries = self.entries.write().await;
        entries.retain(|e| e.participant_id != participant_id);
        debug!("Removed capability {}", participant_id);
    }

    /// Get count of registered entries
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl CapabilitiesLookup for StaticCapabilitiesDirectory {
    async fn lookup(
        &self,
        domain: &str,
        interface_name: &str,
        discovery_qos: &DiscoveryQos,
    ) -> Result<Vec<CapabilityEntry>> {
        let now_ms = chrono::Utc::now().timestamp_millis();
        let entries = self.entries.read().await;

        let matching: Vec<CapabilityEntry> = entries
            .iter()
            .filter(|e| e.domain == domain && e.interface_name == interface_name)
            .filter(|e| {
                let age_ms = now_ms.saturating_sub(e.last_seen_ms).max(0) as u64;
                age_ms <= discovery_qos.cache_max_age_ms
            })
            .cloned()
            .collect();

        debug!(
            "Found {} capabilities for {}/{}",
            matching.len(),
            domain,
            interface_name
        );
        Ok(matching)
    }
}
