//! Environment-driven configuration helpers

use crate::{CoreError, Result};
use std::str::FromStr;
use std::time::Duration;

/// Read and parse an environment variable, falling back to `default` when unset
pub fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().map_err(|_| {
            CoreError::InvalidConfiguration(format!("{} has an invalid value: {:?}", name, raw))
        }),
        Err(_) => Ok(default),
    }
}

/// Read a millisecond duration from the environment
pub fn env_millis(name: &str, default: Duration) -> Result<Duration> {
    let millis = env_parse(name, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}
