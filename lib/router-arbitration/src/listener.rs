//! Observers of arbitration progress

use router_api::ArbitrationResult;
use tokio::sync::watch;
use tracing::trace;

/// Arbitration status reported to the listener
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArbitrationStatus {
    /// A lookup attempt is in progress; reported once per attempt
    Running,
    /// A provider was selected
    Successful,
    /// No compatible provider was found before the timeout
    CanceledForever,
}

/// Sole observer of one arbitration
pub trait ArbitrationListener: Send + Sync {
    /// Called with `Running` for every attempt and with `CanceledForever` on failure
    fn notify_status_changed(&self, status: ArbitrationStatus);

    /// Called once with `Successful` when a provider was selected
    fn set_arbitration_result(&self, status: ArbitrationStatus, result: ArbitrationResult);
}

/// Terminal outcome of an arbitration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArbitrationOutcome {
    Successful(ArbitrationResult),
    CanceledForever,
}

/// Snapshot of an arbitration's progress
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArbitrationProgress {
    /// Latest status reported
    pub status: Option<ArbitrationStatus>,
    /// Number of `Running` notifications seen
    pub attempts: u32,
    /// Terminal outcome, written at most once
    pub outcome: Option<ArbitrationOutcome>,
}

/// Listener publishing arbitration progress on a watch channel.
///
/// Once a terminal outcome is recorded, later notifications are ignored.
pub struct ArbitrationWatcher {
    progress: watch::Sender<ArbitrationProgress>,
}

impl ArbitrationWatcher {
    pub fn new() -> Self {
        let (progress, _) = watch::channel(ArbitrationProgress::default());
        Self { progress }
    }

    /// Subscribe to progress updates
    pub fn subscribe(&self) -> watch::Receiver<ArbitrationProgress> {
        self.progress.subscribe()
    }

    /// Current progress snapshot
    pub fn progress(&self) -> ArbitrationProgress {
        self.progress.borrow().clone()
    }

    /// Wait until the arbitration reaches a terminal state
    pub async fn outcome(&self) -> Option<ArbitrationOutcome> {
        let mut receiver = self.progress.subscribe();
        let progress = receiver.wait_for(|p| p.outcome.is_some()).await.ok()?;
        progress.outcome.clone()
    }

    fn record(&self, status: ArbitrationStatus, outcome: Option<ArbitrationOutcome>) {
        self.progress.send_if_modified(|progress| {
            if progress.outcome.is_some() {
                trace!("Ignoring {:?} after terminal outcome", status);
                return false;
            }
            progress.status = Some(status);
            if status == ArbitrationStatus::Running {
                progress.attempts += 1;
            }
            progress.outcome = outcome;
            true
        });
    }
}

impl Default for ArbitrationWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ArbitrationListener for ArbitrationWatcher {
    fn notify_status_changed(&self, status: ArbitrationStatus) {
        let outcome = match status {
            ArbitrationStatus::CanceledForever => Some(ArbitrationOutcome::CanceledForever),
            _ => None,
        };
        self.record(status, outcome);
    }

    fn set_arbitration_result(&self, status: ArbitrationStatus, result: ArbitrationResult) {
        self.record(status, Some(ArbitrationOutcome::Successful(result)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use router_api::Address;

    #[test]
    fn test_running_counts_attempts() {
        let watcher = ArbitrationWatcher::new();
        watcher.notify_status_changed(ArbitrationStatus::Running);
        watcher.notify_status_changed(ArbitrationStatus::Running);

        let progress = watcher.progress();
        assert_eq!(progress.attempts, 2);
        assert_eq!(progress.status, Some(ArbitrationStatus::Running));
        assert_eq!(progress.outcome, None);
    }

    #[test]
    fn test_terminal_outcome_written_once() {
        let watcher = ArbitrationWatcher::new();
        let result = ArbitrationResult::new("p", vec![Address::InProcess]);

        watcher.notify_status_changed(ArbitrationStatus::Running);
        watcher.set_arbitration_result(ArbitrationStatus::Successful, result.clone());
        watcher.notify_status_changed(ArbitrationStatus::CanceledForever);
        watcher.notify_status_changed(ArbitrationStatus::Running);

        let progress = watcher.progress();
        assert_eq!(progress.status, Some(ArbitrationStatus::Successful));
        assert_eq!(progress.attempts, 1);
        assert_eq!(progress.outcome, Some(ArbitrationOutcome::Successful(result)));
    }

    #[tokio::test]
    async fn test_outcome_resolves_on_cancel() {
        let watcher = std::sync::Arc::new(ArbitrationWatcher::new());
        let notifier = watcher.clone();
        tokio::spawn(async move {
            notifier.notify_status_changed(ArbitrationStatus::Running);
            notifier.notify_status_changed(ArbitrationStatus::CanceledForever);
        });

        assert_eq!(watcher.outcome().await, Some(ArbitrationOutcome::CanceledForever));
    }
}
