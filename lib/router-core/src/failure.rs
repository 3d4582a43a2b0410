//! Failure handlers attached to outbound messages
use crate::CoreError;
use std::fmt;

/// FailureAction is the message originator's handler for terminal dispatch failure.
///
/// It consumes itself on execution, so it runs at most once per message.
pub struct FailureAction {
    action: Box<dyn FnOnce(CoreError) + Send + 'static>,
}

impl FailureAction {
    /// Wrap a closure as a failure action
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce(CoreError) + Send + 'static,
    {
        Self {
            action: Box::new(action),
        }
    }

    /// A failure action that ignores the error
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Run the handler with the given error
    pub fn execute(self, error: CoreError) {
        (self.action)(error)
    }
}

impl fmt::Debug for FailureAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureAction").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_execute_passes_error() {
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let action = FailureAction::new(move |e| {
            *sink.lock().unwrap() = Some(e);
        });

        action.execute(CoreError::Transport("down".to_string()));

        assert_eq!(
            *seen.lock().unwrap(),
            Some(CoreError::Transport("down".to_string()))
        );
    }
}
