// src/limiter.rs

//! Outbound rate limiting for the catalogue API.
//!
//! The catalogue's usage terms allow one request at a time, at least
//! three seconds apart, and at most fifteen requests per minute. The
//! limiter enforces all three: callers queue in FIFO order, and a call
//! beyond the token reservoir waits for the next refill rather than
//! failing. The limiter never retries; errors from the scheduled call
//! pass straight back to the caller.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep_until};

use crate::models::LimiterConfig;

/// State guarded by the admission lock.
struct LimiterState {
    /// Start time of the most recently admitted call
    last_start: Option<Instant>,
    /// Tokens remaining in the current refill window
    tokens: u32,
    /// When the reservoir next refills
    refill_at: Instant,
}

/// FIFO rate limiter with spacing and a token reservoir.
///
/// The admission lock is held for the full duration of the scheduled
/// call, so at most one call is ever in flight. `tokio::sync::Mutex`
/// wakes waiters in FIFO order, which gives the required queue
/// discipline without extra bookkeeping.
#[derive(Clone)]
pub struct RateLimiter {
    state: Arc<Mutex<LimiterState>>,
    min_interval: Duration,
    reservoir: u32,
    refill_interval: Duration,
}

impl RateLimiter {
    /// Create a limiter from configuration.
    pub fn new(config: &LimiterConfig) -> Self {
        let refill_interval = Duration::from_secs(config.refill_interval_secs);
        Self {
            state: Arc::new(Mutex::new(LimiterState {
                last_start: None,
                tokens: config.reservoir,
                refill_at: Instant::now() + refill_interval,
            })),
            min_interval: Duration::from_millis(config.min_interval_ms),
            reservoir: config.reservoir,
            refill_interval,
        }
    }

    /// Run `task` once the limiter admits it.
    ///
    /// Blocks (asynchronously) until the spacing and reservoir
    /// constraints are satisfied, then runs the task to completion
    /// while still holding the admission lock.
    pub async fn schedule<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        let mut state = self.state.lock().await;
        self.admit(&mut state).await;
        task.await
    }

    /// Wait until a call may start, then consume a token.
    async fn admit(&self, state: &mut LimiterState) {
        // Refill windows elapse on a fixed schedule anchored at
        // limiter creation, whether or not tokens were consumed.
        let mut now = Instant::now();
        while now >= state.refill_at {
            state.tokens = self.reservoir;
            state.refill_at += self.refill_interval;
        }

        if state.tokens == 0 {
            let refill_at = state.refill_at;
            sleep_until(refill_at).await;
            state.tokens = self.reservoir;
            state.refill_at += self.refill_interval;
            now = Instant::now();
        }

        if let Some(last) = state.last_start {
            let earliest = last + self.min_interval;
            if earliest > now {
                sleep_until(earliest).await;
            }
        }

        state.tokens -= 1;
        state.last_start = Some(Instant::now());
    }
}
