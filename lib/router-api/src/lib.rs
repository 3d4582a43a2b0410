//! Data model shared by the participant routing core
//!
//! This library defines the records exchanged between the routing pieces:
//! - Address: how a participant can be reached
//! - ProviderQos / CapabilityEntry: what the capabilities directory publishes
//! - ArbitrationResult: the outcome of a successful arbitration
//! - MessageContainer: an outbound message awaiting dispatch

pub mod address;
pub mod capability;
pub mod message;

pub use address::Address;
pub use capability::{ArbitrationResult, CapabilityEntry, ProviderQos};
pub use message::MessageContainer;

/// Custom parameter key carrying the keyword for keyword arbitration
pub const KEYWORD_PARAMETER: &str = "keyword";
