//! Prometheus metrics for message dispatch

use anyhow::Result;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus metrics collector for the message scheduler
#[derive(Clone)]
pub struct DispatchMetrics {
    /// Messages accepted for delayed dispatch
    pub messages_scheduled_total: IntCounter,
    /// Messages rejected at scheduling time, by reason
    pub messages_rejected_total: IntCounterVec,
    /// Messages handed to the transport
    pub messages_dispatched_total: IntCounter,
    /// Accepted messages not yet handed to the transport
    pub messages_pending: IntGauge,
    /// Prometheus registry for metrics
    pub registry: Arc<Registry>,
}

impl DispatchMetrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());

        let messages_scheduled_total = IntCounter::new(
            "messages_scheduled_total",
            "Messages accepted for delayed dispatch",
        )?;

        let messages_rejected_total = IntCounterVec::new(
            Opts::new(
                "messages_rejected_total",
                "Messages rejected at scheduling time",
            ),
            &["reason"],
        )?;

        let messages_dispatched_total = IntCounter::new(
            "messages_dispatched_total",
            "Messages handed to the transport",
        )?;

        let messages_pending = IntGauge::new(
            "messages_pending",
            "Accepted messages waiting for dispatch",
        )?;

        registry.register(Box::new(messages_scheduled_total.clone()))?;
        registry.register(Box::new(messages_rejected_total.clone()))?;
        registry.register(Box::new(messages_dispatched_total.clone()))?;
        registry.register(Box::new(messages_pending.clone()))?;

        Ok(Self {
            messages_scheduled_total,
            messages_rejected_total,
            messages_dispatched_total,
            messages_pending,
            registry,
        })
    }

    pub(crate) fn record_rejected(&self, reason: &str) {
        self.messages_rejected_total.with_label_values(&[reason]).inc();
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = vec![];
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
