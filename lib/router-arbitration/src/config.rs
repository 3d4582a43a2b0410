//! Arbitration polling configuration

use router_core::config::env_millis;
use router_core::{CoreError, Result};
use std::time::Duration;

/// Arbitration polling configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ArbitrationConfig {
    /// Delay between two lookups of the same arbitration
    pub retry_interval: Duration,
    /// Upper bound for a single lookup; a slower lookup counts as an empty result
    pub lookup_timeout: Duration,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_millis(1000),
            lookup_timeout: Duration::from_millis(5000),
        }
    }
}

impl ArbitrationConfig {
    /// Load the configuration from `ROUTER_ARBITRATION_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            retry_interval: env_millis(
                "ROUTER_ARBITRATION_RETRY_INTERVAL_MS",
                defaults.retry_interval,
            )?,
            lookup_timeout: env_millis(
                "ROUTER_ARBITRATION_LOOKUP_TIMEOUT_MS",
                defaults.lookup_timeout,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry_interval.is_zero() {
            return Err(CoreError::InvalidConfiguration(
                "arbitration retry interval must be greater than zero".to_string(),
            ));
        }
        if self.lookup_timeout.is_zero() {
            return Err(CoreError::InvalidConfiguration(
                "arbitration lookup timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
