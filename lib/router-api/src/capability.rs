//! Provider records published by the capabilities directory
use crate::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quality-of-service attributes a provider advertises
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderQos {
    /// Provider priority; negative values are never chosen by priority arbitration
    #[serde(default)]
    pub priority: i64,

    /// Free-form key/value parameters, e.g. the arbitration keyword
    #[serde(default)]
    pub custom_parameters: BTreeMap<String, String>,

    /// Whether the provider supports on-change subscriptions
    #[serde(default)]
    pub supports_on_change_subscriptions: bool,
}

impl ProviderQos {
    /// ProviderQos with the given priority and no custom parameters
    pub fn with_priority(priority: i64) -> Self {
        Self {
            priority,
            ..Default::default()
        }
    }

    /// Add a custom parameter
    pub fn custom_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_parameters.insert(name.into(), value.into());
        self
    }

    /// Set on-change subscription support
    pub fn on_change_subscriptions(mut self, supported: bool) -> Self {
        self.supports_on_change_subscriptions = supported;
        self
    }
}

/// One advertised provider record.
///
/// Entries are immutable once published; arbitration only reads them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityEntry {
    pub domain: String,
    pub interface_name: String,
    #[serde(default)]
    pub provider_qos: ProviderQos,
    pub participant_id: String,
    /// Last time the directory saw this provider (ms since the Unix epoch)
    #[serde(default = "now_ms")]
    pub last_seen_ms: i64,
    pub addresses: Vec<Address>,
}

impl CapabilityEntry {
    /// Create an entry with a single address, last seen now
    pub fn new(
        domain: impl Into<String>,
        interface_name: impl Into<String>,
        provider_qos: ProviderQos,
        participant_id: impl Into<String>,
        address: Address,
    ) -> Self {
        Self {
            domain: domain.into(),
            interface_name: interface_name.into(),
            provider_qos,
            participant_id: participant_id.into(),
            last_seen_ms: now_ms(),
            addresses: vec![address],
        }
    }

    /// Override the last seen timestamp
    pub fn last_seen(mut self, last_seen_ms: i64) -> Self {
        self.last_seen_ms = last_seen_ms;
        self
    }

    /// Value of a provider custom parameter
    pub fn custom_parameter(&self, name: &str) -> Option<&str> {
        self.provider_qos
            .custom_parameters
            .get(name)
            .map(String::as_str)
    }
}

/// Outcome of a successful arbitration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArbitrationResult {
    pub participant_id: String,
    pub addresses: Vec<Address>,
}

impl ArbitrationResult {
    pub fn new(participant_id: impl Into<String>, addresses: Vec<Address>) -> Self {
        Self {
            participant_id: participant_id.into(),
            addresses,
        }
    }
}

impl From<&CapabilityEntry> for ArbitrationResult {
    fn from(entry: &CapabilityEntry) -> Self {
        Self {
            participant_id: entry.participant_id.clone(),
            addresses: entry.addresses.clone(),
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
