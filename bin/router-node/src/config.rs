//! Node configuration read from the environment

use anyhow::Result;
use router_api::KEYWORD_PARAMETER;
use router_arbitration::{ArbitrationConfig, ArbitrationStrategy, DiscoveryQos};
use router_core::config::env_parse;
use router_dispatch::SchedulerConfig;
use std::path::PathBuf;

/// Everything the node needs to arbitrate and dispatch
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// YAML or JSON file with the capability entries to serve
    pub capabilities_file: Option<PathBuf>,
    pub domain: String,
    pub interface_name: String,
    pub discovery_timeout_ms: u64,
    /// When set, keyword arbitration is used instead of highest priority
    pub keyword: Option<String>,
    pub arbitration: ArbitrationConfig,
    pub scheduler: SchedulerConfig,
}

impl NodeConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            capabilities_file: std::env::var("ROUTER_CAPABILITIES_FILE")
                .ok()
                .map(PathBuf::from),
            domain: env_parse("ROUTER_DOMAIN", "default".to_string())?,
            interface_name: env_parse("ROUTER_INTERFACE", "default".to_string())?,
            discovery_timeout_ms: env_parse("ROUTER_DISCOVERY_TIMEOUT_MS", 10_000)?,
            keyword: std::env::var("ROUTER_KEYWORD").ok().filter(|k| !k.is_empty()),
            arbitration: ArbitrationConfig::from_env()?,
            scheduler: SchedulerConfig::from_env()?,
        })
    }

    /// DiscoveryQos derived from the configured strategy and timeout
    pub fn discovery_qos(&self) -> DiscoveryQos {
        match &self.keyword {
            Some(keyword) => DiscoveryQos::new(
                self.discovery_timeout_ms,
                ArbitrationStrategy::Keyword,
                u64::MAX,
            )
            .with_custom_parameter(KEYWORD_PARAMETER, keyword.clone()),
            None => DiscoveryQos::new(
                self.discovery_timeout_ms,
                ArbitrationStrategy::HighestPriority,
                u64::MAX,
            ),
        }
    }
}
