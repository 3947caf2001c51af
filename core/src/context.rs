//! Request-scoped cancellation and deadlines
//!
//! A [`Context`] is handed down from the caller into every operation that may
//! wait on the network. It fires when the caller cancels it or when its
//! deadline passes, whichever happens first.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a context is done
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, Clone)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never done unless cancelled explicitly
    pub fn background() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Derive a context cancelled together with `self`, whose deadline is the
    /// earlier of the parent's and `now + timeout`.
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        Self {
            cancel: self.cancel.child_token(),
            deadline: Some(match self.deadline {
                Some(parent) => parent.min(deadline),
                None => deadline,
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Non-blocking check; `None` while the context is still live.
    pub fn err(&self) -> Option<ContextError> {
        if self.cancel.is_cancelled() {
            return Some(ContextError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(ContextError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => ContextError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => ContextError::DeadlineExceeded,
                }
            }
            None => {
                self.cancel.cancelled().await;
                ContextError::Cancelled
            }
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_background_is_live_until_cancelled() {
        let ctx = Context::background();
        assert_eq!(ctx.err(), None);

        ctx.cancel();
        assert_eq!(ctx.err(), Some(ContextError::Cancelled));
        assert_eq!(ctx.done().await, ContextError::Cancelled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_fires() {
        let ctx = Context::with_timeout(Duration::from_secs(1));
        assert_eq!(ctx.err(), None);

        assert_eq!(ctx.done().await, ContextError::DeadlineExceeded);
        assert_eq!(ctx.err(), Some(ContextError::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_child_inherits_cancellation_and_earlier_deadline() {
        let parent = Context::with_timeout(Duration::from_secs(1));
        let child = parent.child_with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());

        parent.cancel();
        assert_eq!(child.err(), Some(ContextError::Cancelled));
    }
}
