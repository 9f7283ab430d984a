use std::time::Duration;
use tokio::sync::watch;

use crate::errors::CoreError;

/// Owner side of the cooperative stop signal. Dropping it never cancels.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

/// Cooperative stop signal observed at every suspension point of a run
/// (backoff, inter-page delay, market rate limiting).
///
/// What a cancelled wait means is up to the caller: the fetcher turns it into
/// `CoreError::Cancelled`, the rate limiter just stops waiting.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelSignal { rx })
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl CancelSignal {
    /// A signal that is never raised.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if the handle
    /// went away without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let raised = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if !raised {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration` unless cancelled first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), CoreError> {
        if self.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.cancelled() => Err(CoreError::Cancelled),
        }
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::never()
    }
}
