//! Outbound messages
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// An outbound message awaiting dispatch.
///
/// The payload is already serialized; the routing core never looks inside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContainer {
    pub message_id: String,
    pub channel_id: String,
    pub payload: Bytes,
}

impl MessageContainer {
    /// Create a message with a freshly generated message id
    pub fn new(channel_id: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            channel_id: channel_id.into(),
            payload: payload.into(),
        }
    }

    /// Create a message with a caller-chosen message id
    pub fn with_id(
        message_id: impl Into<String>,
        channel_id: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            message_id: message_id.into(),
            channel_id: channel_id.into(),
            payload: payload.into(),
        }
    }
}
