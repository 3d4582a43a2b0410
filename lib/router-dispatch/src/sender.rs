//! Transport seam used by the message scheduler

use router_api::MessageContainer;
use router_core::{CoreError, FailureAction};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use tracing::{debug, warn};

/// Delivers a message over some transport.
///
/// Implementations own retries; on irrecoverable failure they invoke the
/// failure action with the error.
#[async_trait::async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(&self, message: MessageContainer, failure_action: FailureAction);
}

/// In-process sender delivering into a tokio channel.
///
/// Fails the message when the receiving side is gone or stays full for
/// longer than the send timeout.
#[derive(Clone, Debug)]
pub struct ChannelSender {
    tx: mpsc::Sender<MessageContainer>,
    timeout: Duration,
}

impl ChannelSender {
    pub fn new(tx: mpsc::Sender<MessageContainer>, timeout: Duration) -> Self {
        Self { tx, timeout }
    }

    /// Create a sender together with the receiving end of its channel
    pub fn channel(
        buffer: usize,
        timeout: Duration,
    ) -> (Self, mpsc::Receiver<MessageContainer>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self::new(tx, timeout), rx)
    }
}

#[async_trait::async_trait]
impl MessageSender for ChannelSender {
    async fn send(&self, message: MessageContainer, failure_action: FailureAction) {
        let message_id = message.message_id.clone();
        match self.tx.send_timeout(message, self.timeout).await {
            Ok(()) => {
                debug!("Delivered message {} in process", message_id);
            }
            Err(SendTimeoutError::Timeout(_)) => {
                warn!("In-process delivery of message {} timed out", message_id);
                failure_action.execute(CoreError::Transport(format!(
                    "delivery of message {} timed out after {:?}",
                    message_id, self.timeout
                )));
            }
            Err(SendTimeoutError::Closed(_)) => {
                warn!("In-process receiver closed, dropping message {}", message_id);
                failure_action.execute(CoreError::Transport(format!(
                    "receiver closed for message {}",
                    message_id
                )));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_action() -> (FailureAction, Arc<Mutex<Vec<CoreError>>>) {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let action = FailureAction::new(move |e| sink.lock().unwrap().push(e));
        (action, errors)
    }

    #[tokio::test]
    async fn test_delivers_message() {
        let (sender, mut rx) = ChannelSender::channel(4, Duration::from_secs(1));
        let (action, errors) = recording_action();
        let message = MessageContainer::with_id("m-1", "c-1", "hello");

        sender.send(message.clone(), action).await;

        assert_eq!(rx.recv().await, Some(message));
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_closed_receiver_fails_message() {
        let (sender, rx) = ChannelSender::channel(4, Duration::from_secs(1));
        drop(rx);
        let (action, errors) = recording_action();

        sender
            .send(MessageContainer::with_id("m-1", "c-1", "hello"), action)
            .await;

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], CoreError::Transport(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_channel_times_out() {
        let (sender, _rx) = ChannelSender::channel(1, Duration::from_millis(50));
        sender
            .send(MessageContainer::with_id("m-1", "c", "x"), FailureAction::noop())
            .await;

        let (action, errors) = recording_action();
        sender
            .send(MessageContainer::with_id("m-2", "c", "y"), action)
            .await;

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("timed out"));
    }
}
