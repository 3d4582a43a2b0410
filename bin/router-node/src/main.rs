use anyhow::{bail, Result};
use router_api::{ArbitrationResult, MessageContainer};
use router_arbitration::{
    ArbitrationOutcome, ArbitrationWatcher, Arbitrator, StaticCapabilitiesDirectory,
};
use router_core::{FailureAction, RoutingTable};
use router_dispatch::{ChannelSender, DispatchMetrics, MessageScheduler};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::init as tracing_init;

mod capabilities;
mod config;

use config::NodeConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    info!("Starting router-node...");

    let config = NodeConfig::from_env()?;
    debug!("Node configuration: {:?}", config);

    // Capabilities directory
    let directory = match &config.capabilities_file {
        Some(path) => StaticCapabilitiesDirectory::from_entries(capabilities::load_entries(path)?),
        None => {
            warn!("ROUTER_CAPABILITIES_FILE not set - capabilities directory is empty");
            StaticCapabilitiesDirectory::new()
        }
    };

    let routing_table = RoutingTable::new();
    info!("Routing table initialized");

    // Arbitrate a provider for the configured domain/interface
    let result = arbitrate(&config, directory).await?;
    let participant_id = result.participant_id.clone();
    match result.addresses.first() {
        Some(address) => {
            if let Some(existing) = routing_table.put(participant_id.clone(), address.clone()) {
                info!("Keeping existing route {} for {}", existing, participant_id);
            }
        }
        None => bail!("Participant {} advertises no addresses", participant_id),
    }

    // Message dispatch
    let metrics = DispatchMetrics::new()?;
    let (sender, mut deliveries) = ChannelSender::channel(64, Duration::from_secs(5));
    let scheduler = MessageScheduler::new(Arc::new(sender), config.scheduler.clone())?
        .with_metrics(metrics.clone());
    info!(
        "Message scheduler initialized (capacity {})",
        scheduler.config().capacity
    );

    tokio::spawn(async move {
        while let Some(message) = deliveries.recv().await {
            info!(
                "Delivered message {} on channel {} ({} bytes)",
                message.message_id,
                message.channel_id,
                message.payload.len()
            );
        }
    });

    // Probe the selected participant through its registered route
    if let Some(address) = routing_table.get(&participant_id) {
        let channel_id = address
            .channel_id()
            .map(str::to_string)
            .unwrap_or_else(|| participant_id.clone());
        let probe = MessageContainer::new(channel_id, "probe");
        let route_owner = participant_id.clone();
        let table = routing_table.clone();
        let on_failure = FailureAction::new(move |e| {
            warn!("Probe to {} failed: {}", route_owner, e);
            table.remove(&route_owner);
        });
        if let Err(e) = scheduler.schedule_message(probe, Duration::from_millis(100), on_failure) {
            error!("Unable to schedule probe message: {}", e);
        }
    }

    // Keep the process alive
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting...");

    scheduler.shutdown().await;
    match metrics.gather() {
        Ok(text) => debug!("Dispatch metrics:\n{}", text),
        Err(e) => debug!("Failed to gather metrics: {}", e),
    }

    Ok(())
}

async fn arbitrate(
    config: &NodeConfig,
    directory: StaticCapabilitiesDirectory,
) -> Result<ArbitrationResult> {
    let watcher = Arc::new(ArbitrationWatcher::new());
    let mut arbitrator = Arbitrator::new(
        config.domain.clone(),
        config.interface_name.clone(),
        config.discovery_qos(),
        Arc::new(directory),
    )
    .with_config(config.arbitration.clone());
    arbitrator.set_arbitration_listener(watcher.clone());
    arbitrator.start_arbitration()?;

    match watcher.outcome().await {
        Some(ArbitrationOutcome::Successful(result)) => {
            info!(
                "Arbitration selected {} for {}/{}",
                result.participant_id, config.domain, config.interface_name
            );
            Ok(result)
        }
        Some(ArbitrationOutcome::CanceledForever) | None => bail!(
            "No compatible provider found for {}/{} after {} attempt(s)",
            config.domain,
            config.interface_name,
            watcher.progress().attempts
        ),
    }
}
