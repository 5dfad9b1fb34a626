//! Cancellation and timeout signal for one streaming call

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

type CancelPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Cancellation predicate and timeout budget for a streaming call
///
/// The predicate is polled before every byte read and every parsed frame.
/// The timeout is handed to the transport; nothing here runs a timer.
#[derive(Clone, Default)]
pub struct StreamContext {
    cancel: Option<CancelPredicate>,
    timeout: Option<Duration>,
}

impl StreamContext {
    /// Context with no cancellation and no timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel when `predicate` returns true
    #[must_use]
    pub fn with_cancellation(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.cancel = Some(Arc::new(predicate));
        self
    }

    /// Cancel once `flag` is set
    #[must_use]
    pub fn with_cancel_flag(self, flag: Arc<AtomicBool>) -> Self {
        self.with_cancellation(move || flag.load(Ordering::Relaxed))
    }

    /// Cancel once `token` is cancelled
    #[must_use]
    pub fn with_cancellation_token(self, token: CancellationToken) -> Self {
        self.with_cancellation(move || token.is_cancelled())
    }

    /// Wall-clock budget for the whole request
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Evaluate the cancellation predicate
    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|predicate| predicate())
    }

    /// Timeout budget for the transport
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for StreamContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamContext")
            .field("cancellable", &self.cancel.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}
