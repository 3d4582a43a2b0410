//! Core routing functionality
//!
//! This library provides:
//! - Routing table mapping participant ids to addresses
//! - Failure actions attached to outbound messages
//! - Error types shared by arbitration and dispatch
//! - Environment configuration helpers

pub mod config;
pub mod error;
pub mod failure;
pub mod routing_table;

pub use error::{CoreError, Result};
pub use failure::FailureAction;
pub use routing_table::RoutingTable;
