use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised by the routing core.
///
/// Cloneable so that one rejection can reach both the caller and the
/// message's failure action.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Message scheduler is shutting down already. Unable to send message [messageId: {message_id}]")]
    ShutdownInProgress { message_id: String },

    #[error("Send buffer full ({capacity} pending). Unable to schedule message [messageId: {message_id}]")]
    CapacityExceeded { message_id: String, capacity: usize },

    #[error("No compatible provider found for domain {domain}, interface {interface_name}")]
    NoCompatibleProviderFound {
        domain: String,
        interface_name: String,
    },

    #[error("Arbitration already started")]
    ArbitrationAlreadyStarted,

    #[error("Arbitration listener must be set before starting arbitration")]
    ListenerNotSet,

    #[error("Capabilities lookup failed: {0}")]
    LookupFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
