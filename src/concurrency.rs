//! Concurrency and rate gating for request dispatch.
//!
//! A [`DispatchGate`] enforces the two limits of a run:
//!
//! - at most `concurrency` requests are processed at once. A slot is taken
//!   when a request leaves the queue and released when its whole pipeline,
//!   item processing included, is done;
//! - two fetch dispatches are at least `request_delay` apart, measured from
//!   dispatch start.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{AcquireError, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::time::{sleep_until, Instant};
use tracing::trace;

#[derive(Debug)]
pub(crate) struct DispatchGate {
    semaphore: Arc<Semaphore>,
    delay: Duration,
    last_dispatch: Mutex<Option<Instant>>,
}

impl DispatchGate {
    pub(crate) fn new(concurrency: usize, delay: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            delay,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Waits for a free processing slot.
    pub(crate) async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        Arc::clone(&self.semaphore).acquire_owned().await
    }

    /// Waits until a fetch may be dispatched and records the dispatch.
    ///
    /// The clock lock is held across the sleep so concurrent callers line up
    /// one `delay` apart.
    pub(crate) async fn wait_for_dispatch(&self) {
        let mut last_dispatch = self.last_dispatch.lock().await;
        if let Some(previous) = *last_dispatch {
            let ready_at = previous + self.delay;
            if ready_at > Instant::now() {
                trace!("Delaying dispatch by {:?}", ready_at - Instant::now());
                sleep_until(ready_at).await;
            }
        }
        *last_dispatch = Some(Instant::now());
    }
}
