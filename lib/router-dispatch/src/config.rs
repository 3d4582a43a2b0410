//! Message scheduler configuration

use router_core::config::{env_millis, env_parse};
use router_core::{CoreError, Result};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Grace period granted to in-flight messages on shutdown
pub const TERMINATION_TIMEOUT: Duration = Duration::from_millis(5000);

/// Message scheduler configuration
#[derive(Clone, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Maximum number of accepted messages waiting for or undergoing dispatch
    pub capacity: usize,
    /// How long shutdown waits for accepted messages
    pub termination_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            termination_timeout: TERMINATION_TIMEOUT,
        }
    }
}

impl SchedulerConfig {
    /// Load the configuration from `ROUTER_SCHEDULER_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            capacity: env_parse("ROUTER_SCHEDULER_CAPACITY", defaults.capacity)?,
            termination_timeout: env_millis(
                "ROUTER_SCHEDULER_TERMINATION_TIMEOUT_MS",
                defaults.termination_timeout,
            )?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let max = Semaphore::MAX_PERMITS.min(u32::MAX as usize);
        if self.capacity == 0 || self.capacity > max {
            return Err(CoreError::InvalidConfiguration(format!(
                "scheduler capacity must be between 1 and {}, got {}",
                max, self.capacity
            )));
        }
        Ok(())
    }
}
