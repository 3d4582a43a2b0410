//! Provider arbitration
//!
//! This library provides:
//! - Arbitration strategies (keyword, highest priority, custom)
//! - The Arbitrator polling state machine
//! - Listener types observing arbitration progress
//! - The capabilities lookup seam and an in-memory directory

pub mod arbitrator;
pub mod config;
pub mod listener;
pub mod lookup;
pub mod qos;
pub mod strategy;

pub use arbitrator::Arbitrator;
pub use config::ArbitrationConfig;
pub use listener::{
    ArbitrationListener, ArbitrationOutcome, ArbitrationProgress, ArbitrationStatus,
    ArbitrationWatcher,
};
pub use lookup::{CapabilitiesLookup, StaticCapabilitiesDirectory};
pub use qos::DiscoveryQos;
pub use strategy::{ArbitrationStrategy, ArbitrationStrategyFunction};
