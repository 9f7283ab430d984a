use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::cancel::CancelSignal;

/// Enforces a minimum interval between consecutive admissions to one
/// external dependency.
///
/// Admission is serialized: callers queue on the inner mutex, so two
/// concurrent callers are spaced by `interval` rather than both sleeping the
/// same amount and firing together.
pub struct RateLimiter {
    interval: Duration,
    last_admission: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_admission: Mutex::new(None),
        }
    }

    /// Wait until `interval` has passed since the previous admission.
    ///
    /// The first call never waits. A cancelled wait is cut short and the
    /// caller is admitted anyway; cancellation is not an error here.
    pub async fn acquire(&self, cancel: &CancelSignal) {
        let mut last = self.last_admission.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.interval;
            let now = Instant::now();
            if ready_at > now {
                let wait = ready_at - now;
                tracing::debug!(wait_ms = wait.as_millis() as u64, "rate limiter waiting");
                if cancel.sleep(wait).await.is_err() {
                    tracing::debug!("rate limiter wait interrupted by cancellation");
                }
            }
        }
        *last = Some(Instant::now());
    }
}
