//! Delayed message dispatch
//!
//! This library provides:
//! - MessageScheduler: delayed, capacity-bounded dispatch with graceful shutdown
//! - MessageSender: the transport seam, plus an in-process channel sender
//! - Prometheus metrics for scheduling and dispatch

pub mod config;
pub mod metrics;
pub mod scheduler;
pub mod sender;

pub use config::SchedulerConfig;
pub use metrics::DispatchMetrics;
pub use scheduler::MessageScheduler;
pub use sender::{ChannelSender, MessageSender};
