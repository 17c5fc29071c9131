//! Request pacing for the fetch pool
//!
//! A single [`RateLimiter`] is shared by every fetch of a job, so request
//! start times across the whole pool are at least `delay` apart.

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Pool-wide minimum spacing between request starts
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,

    /// Earliest instant the next request may start
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter spacing requests by `delay`
    ///
    /// A zero delay makes [`acquire`](Self::acquire) return immediately.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_slot: Mutex::new(None),
        }
    }

    pub fn from_millis(delay_ms: u64) -> Self {
        Self::new(Duration::from_millis(delay_ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Waits until this caller's request slot
    ///
    /// Slots are reserved under the lock and slept on outside it, so
    /// waiting callers are served in reservation order and never share a
    /// slot.
    pub async fn acquire(&self) {
        if self.delay.is_zero() {
            return;
        }

        let slot = {
            let mut next = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next {
                Some(at) if at > now => at,
                _ => now,
            };
            *next = Some(slot + self.delay);
            slot
        };

        if slot > Instant::now() {
            tracing::trace!("Rate limiter waiting {:?}", slot - Instant::now());
            tokio::time::sleep_until(slot).await;
        }
    }
}
