//! Message scheduler: delayed, non-blocking dispatch through a MessageSender
//!
//! Every accepted message holds one capacity slot until the transport
//! returns. Shutdown stops acceptance and then waits, bounded by the
//! termination timeout, for all slots to come back.

use crate::{DispatchMetrics, MessageSender, SchedulerConfig};
use router_api::MessageContainer;
use router_core::{CoreError, FailureAction, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SchedulerState {
    Accepting,
    ShuttingDown,
}

/// Schedules outbound messages for delayed delivery
pub struct MessageScheduler {
    sender: Arc<dyn MessageSender>,
    config: SchedulerConfig,
    // Guards the accept-or-reject decision against the shutdown transition
    state: Mutex<SchedulerState>,
    slots: Arc<Semaphore>,
    runtime: Handle,
    metrics: Option<DispatchMetrics>,
}

impl MessageScheduler {
    /// Create a scheduler dispatching on the current tokio runtime
    pub fn new(sender: Arc<dyn MessageSender>, config: SchedulerConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| CoreError::Internal(format!("no tokio runtime available: {}", e)))?;
        Self::with_runtime(sender, config, runtime)
    }

    /// Create a scheduler dispatching on the given runtime
    pub fn with_runtime(
        sender: Arc<dyn MessageSender>,
        config: SchedulerConfig,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            sender,
            slots: Arc::new(Semaphore::new(config.capacity)),
            config,
            state: Mutex::new(SchedulerState::Accepting),
            runtime,
            metrics: None,
        })
    }

    /// Record scheduling and dispatch metrics
    pub fn with_metrics(mut self, metrics: DispatchMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Arrange for `message` to be sent after `delay`; never blocks.
    ///
    /// After shutdown has begun the message is rejected with
    /// `ShutdownInProgress`, reported both to `failure_action` and to the
    /// caller. When all capacity slots are taken the message is rejected with
    /// `CapacityExceeded`, reported to the caller only.
    pub fn schedule_message(
        &self,
        message: MessageContainer,
        delay: Duration,
        failure_action: FailureAction,
    ) -> Result<()> {
        trace!(
            "scheduleMessage messageId: {} channelId {}",
            message.message_id,
            message.channel_id
        );

        let state = self.lock_state();
        if *state == SchedulerState::ShuttingDown {
            drop(state);
            let error = CoreError::ShutdownInProgress {
                message_id: message.message_id,
            };
            warn!("{}", error);
            if let Some(metrics) = &self.metrics {
                metrics.record_rejected("shutdown");
            }
            failure_action.execute(error.clone());
            return Err(error);
        }

        let permit = match self.slots.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                let error = CoreError::CapacityExceeded {
                    message_id: message.message_id,
                    capacity: self.config.capacity,
                };
                error!("Execution rejected while scheduling message: {}", error);
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejected("capacity");
                }
                return Err(error);
            }
        };

        if let Some(metrics) = &self.metrics {
            metrics.messages_scheduled_total.inc();
            metrics.messages_pending.inc();
        }

        let sender = self.sender.clone();
        let metrics = self.metrics.clone();
        self.runtime.spawn(async move {
            time::sleep(delay).await;
            sender.send(message, failure_action).await;
            if let Some(metrics) = metrics {
                metrics.messages_dispatched_total.inc();
                metrics.messages_pending.dec();
            }
            drop(permit);
        });
        drop(state);

        Ok(())
    }

    /// Stop accepting messages and wait, at most the termination timeout,
    /// for accepted messages to be dispatched.
    ///
    /// Messages still pending afterwards are neither cancelled nor reported.
    pub async fn shutdown(&self) {
        {
            let mut state = self.lock_state();
            if *state == SchedulerState::ShuttingDown {
                debug!("Message scheduler shutdown already in progress");
            }
            *state = SchedulerState::ShuttingDown;
        }

        info!(
            "Message scheduler shutting down, waiting up to {:?} for {} pending message(s)",
            self.config.termination_timeout,
            self.pending()
        );

        // Holding every slot means nothing is in flight anymore
        let all_slots = self.config.capacity as u32;
        match time::timeout(
            self.config.termination_timeout,
            self.slots.acquire_many(all_slots),
        )
        .await
        {
            Ok(Ok(_permits)) => {
                info!("Message scheduler terminated, all accepted messages dispatched");
            }
            Ok(Err(e)) => {
                warn!("Message scheduler slots unavailable during shutdown: {}", e);
            }
            Err(_) => {
                // TODO: hand abandoned messages back to their owners instead of dropping them
                warn!(
                    "Message scheduler termination timeout elapsed, abandoning {} pending message(s)",
                    self.pending()
                );
            }
        }
    }

    /// Whether shutdown has begun
    pub fn is_shutdown(&self) -> bool {
        *self.lock_state() == SchedulerState::ShuttingDown
    }

    /// Number of accepted messages not yet handed back by the transport
    pub fn pending(&self) -> usize {
        self.config.capacity - self.slots.available_permits()
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    fn lock_state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records sent messages; optionally fails every message
    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<MessageContainer>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl MessageSender for RecordingSender {
        async fn send(&self, message: MessageContainer, failure_action: FailureAction) {
            if self.fail {
                failure_action.execute(CoreError::Transport("unreachable".to_string()));
                return;
            }
            self.sent.lock().unwrap().push(message);
        }
    }

    fn counting_action() -> (FailureAction, Arc<Mutex<Vec<CoreError>>>) {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = errors.clone();
        let action = FailureAction::new(move |e| sink.lock().unwrap().push(e));
        (action, errors)
    }

    fn message(id: &str) -> MessageContainer {
        MessageContainer::with_id(id, "testChannelId", "payload")
    }

    fn scheduler(sender: Arc<RecordingSender>, capacity: usize) -> MessageScheduler {
        MessageScheduler::new(
            sender,
            SchedulerConfig {
                capacity,
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_message_sent_after_delay() {
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler(sender.clone(), 8);

        scheduler
            .schedule_message(message("m-1"), Duration::from_millis(500), FailureAction::noop())
            .unwrap();
        assert_eq!(scheduler.pending(), 1);

        time::sleep(Duration::from_millis(400)).await;
        assert!(sender.sent.lock().unwrap().is_empty());

        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*sender.sent.lock().unwrap(), vec![message("m-1")]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_schedule_after_shutdown_notifies_both() {
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler(sender.clone(), 8);
        scheduler.shutdown().await;
        assert!(scheduler.is_shutdown());

        let (action, errors) = counting_action();
        let result = scheduler.schedule_message(message("late"), Duration::ZERO, action);

        let expected = CoreError::ShutdownInProgress {
            message_id: "late".to_string(),
        };
        assert_eq!(result, Err(expected.clone()));
        assert_eq!(*errors.lock().unwrap(), vec![expected]);
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_exceeded_does_not_notify_failure_action() {
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler(sender.clone(), 1);

        scheduler
            .schedule_message(message("first"), Duration::from_secs(10), FailureAction::noop())
            .unwrap();

        let (action, errors) = counting_action();
        let result = scheduler.schedule_message(message("second"), Duration::ZERO, action);

        assert_eq!(
            result,
            Err(CoreError::CapacityExceeded {
                message_id: "second".to_string(),
                capacity: 1,
            })
        );
        assert!(errors.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_is_released_after_dispatch() {
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler(sender.clone(), 1);

        scheduler
            .schedule_message(message("first"), Duration::from_millis(10), FailureAction::noop())
            .unwrap();
        time::sleep(Duration::from_millis(20)).await;

        scheduler
            .schedule_message(message("second"), Duration::ZERO, FailureAction::noop())
            .unwrap();
        time::sleep(Duration::from_millis(1)).await;

        assert_eq!(sender.sent.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_messages() {
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler(sender.clone(), 8);
        scheduler
            .schedule_message(message("m-1"), Duration::from_millis(100), FailureAction::noop())
            .unwrap();

        let started = time::Instant::now();
        scheduler.shutdown().await;

        assert_eq!(sender.sent.lock().unwrap().len(), 1);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_returns_after_grace_period() {
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler(sender.clone(), 8);
        scheduler
            .schedule_message(message("slow"), Duration::from_secs(60), FailureAction::noop())
            .unwrap();

        let started = time::Instant::now();
        scheduler.shutdown().await;
        let waited = started.elapsed();

        assert!(waited >= Duration::from_millis(5000));
        assert!(waited < Duration::from_secs(60));
        assert!(sender.sent.lock().unwrap().is_empty());
        assert_eq!(scheduler.pending(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_reaches_failure_action_once() {
        let sender = Arc::new(RecordingSender {
            fail: true,
            ..Default::default()
        });
        let scheduler = scheduler(sender, 8);
        let (action, errors) = counting_action();

        scheduler
            .schedule_message(message("m-1"), Duration::ZERO, action)
            .unwrap();
        scheduler.shutdown().await;

        assert_eq!(
            *errors.lock().unwrap(),
            vec![CoreError::Transport("unreachable".to_string())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_metrics_are_recorded() {
        let metrics = DispatchMetrics::new().unwrap();
        let sender = Arc::new(RecordingSender::default());
        let scheduler = scheduler(sender, 1).with_metrics(metrics.clone());

        scheduler
            .schedule_message(message("a"), Duration::from_millis(5), FailureAction::noop())
            .unwrap();
        let _ = scheduler.schedule_message(message("b"), Duration::ZERO, FailureAction::noop());
        scheduler.shutdown().await;
        let _ = scheduler.schedule_message(message("c"), Duration::ZERO, FailureAction::noop());

        assert_eq!(metrics.messages_scheduled_total.get(), 1);
        assert_eq!(metrics.messages_dispatched_total.get(), 1);
        assert_eq!(metrics.messages_pending.get(), 0);
        assert_eq!(
            metrics.messages_rejected_total.with_label_values(&["capacity"]).get(),
            1
        );
        assert_eq!(
            metrics.messages_rejected_total.with_label_values(&["shutdown"]).get(),
            1
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_no_message_accepted_after_shutdown_observed() {
        let sender = Arc::new(RecordingSender::default());
        let scheduler = Arc::new(scheduler(sender.clone(), 10_000));
        let accepted = Arc::new(AtomicUsize::new(0));
        let accepted_after_shutdown = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let scheduler = scheduler.clone();
                let accepted = accepted.clone();
                let accepted_after_shutdown = accepted_after_shutdown.clone();
                tokio::spawn(async move {
                    for i in 0..200 {
                        let was_shutdown = scheduler.is_shutdown();
                        let result = scheduler.schedule_message(
                            message(&format!("{}-{}", p, i)),
                            Duration::ZERO,
                            FailureAction::noop(),
                        );
                        if result.is_ok() {
                            accepted.fetch_add(1, Ordering::SeqCst);
                            if was_shutdown {
                                accepted_after_shutdown.fetch_add(1, Ordering::SeqCst);
                            }
                        }
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        tokio::task::yield_now().await;
        scheduler.shutdown().await;
        for producer in producers {
            producer.await.unwrap();
        }

        assert_eq!(accepted_after_shutdown.load(Ordering::SeqCst), 0);
        assert!(sender.sent.lock().unwrap().len() <= accepted.load(Ordering::SeqCst));
    }
}
