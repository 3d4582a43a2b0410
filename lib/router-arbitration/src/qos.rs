//! Discovery quality-of-service requested by the caller

use crate::ArbitrationStrategy;
use std::collections::BTreeMap;
use std::time::Duration;

/// DiscoveryQos controls one arbitration: strategy, timeout and provider filters.
#[derive(Clone, Debug)]
pub struct DiscoveryQos {
    /// Total time allowed for arbitration; 0 means a single attempt
    pub timeout_ms: u64,
    pub arbitration_strategy: ArbitrationStrategy,
    /// Maximum age of cached capability entries that may be used
    pub cache_max_age_ms: u64,
    pub custom_parameters: BTreeMap<String, String>,
    /// Only consider providers supporting on-change subscriptions
    pub provider_must_support_on_change: bool,
}

impl Default for DiscoveryQos {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            arbitration_strategy: ArbitrationStrategy::default(),
            cache_max_age_ms: u64::MAX,
            custom_parameters: BTreeMap::new(),
            provider_must_support_on_change: false,
        }
    }
}

impl DiscoveryQos {
    pub fn new(
        timeout_ms: u64,
        arbitration_strategy: ArbitrationStrategy,
        cache_max_age_ms: u64,
    ) -> Self {
        Self {
            timeout_ms,
            arbitration_strategy,
            cache_max_age_ms,
            ..Default::default()
        }
    }

    pub fn add_custom_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.custom_parameters.insert(name.into(), value.into());
    }

    pub fn with_custom_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.add_custom_parameter(name, value);
        self
    }

    pub fn with_provider_must_support_on_change(mut self, required: bool) -> Self {
        self.provider_must_support_on_change = required;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_api::KEYWORD_PARAMETER;

    #[test]
    fn test_builder() {
        let qos = DiscoveryQos::new(1000, ArbitrationStrategy::Keyword, u64::MAX)
            .with_custom_parameter(KEYWORD_PARAMETER, "testKeyword")
            .with_provider_must_support_on_change(true);

        assert_eq!(qos.timeout(), Duration::from_secs(1));
        assert_eq!(qos.custom_parameters.get(KEYWORD_PARAMETER).unwrap(), "testKeyword");
        assert!(qos.provider_must_support_on_change);
        assert!(matches!(qos.arbitration_strategy, ArbitrationStrategy::Keyword));
    }

    #[test]
    fn test_default() {
        let qos = DiscoveryQos::default();
        assert_eq!(qos.timeout_ms, 30_000);
        assert!(matches!(qos.arbitration_strategy, ArbitrationStrategy::HighestPriority));
        assert!(!qos.provider_must_support_on_change);
    }
}
