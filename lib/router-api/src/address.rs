//! Reachability tokens for participants
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address identifies how a participant can be reached.
///
/// The routing core never interprets an address; it only stores it,
/// compares it by value and hands it back to the transport layer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Address {
    /// Long-polling channel identified by its channel id
    #[serde(rename_all = "camelCase")]
    Channel { channel_id: String },

    /// WebSocket endpoint
    WebSocket {
        host: String,
        port: u16,
        #[serde(default = "default_path")]
        path: String,
    },

    /// MQTT broker and topic
    #[serde(rename_all = "camelCase")]
    Mqtt { broker_uri: String, topic: String },

    /// Participant living in the same process
    InProcess,
}

impl Address {
    /// Create a channel address
    pub fn channel(channel_id: impl Into<String>) -> Self {
        Address::Channel {
            channel_id: channel_id.into(),
        }
    }

    /// Channel id of the address, if it is channel based
    pub fn channel_id(&self) -> Option<&str> {
        match self {
            Address::Channel { channel_id } => Some(channel_id),
            _ => None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Channel { channel_id } => write!(f, "channel:{}", channel_id),
            Address::WebSocket { host, port, path } => write!(f, "ws://{}:{}{}", host, port, path),
            Address::Mqtt { broker_uri, topic } => write!(f, "mqtt:{}#{}", broker_uri, topic),
            Address::InProcess => write!(f, "in-process"),
        }
    }
}

fn default_path() -> String {
    "/".to_string()
}
