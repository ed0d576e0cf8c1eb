use std::time::{Duration, Instant};

use log::debug;
use parking_lot::Mutex;

/// Default minimum delay between external API calls in milliseconds
/// (the metadata service allows one request per second)
pub const DEFAULT_RATE_LIMIT_MS: u64 = 1000;

/// RateLimiter ensures that calls to the external services respect a single
/// shared request budget
///
/// The limit is global across all pipeline stages and all concurrent
/// resolutions: two calls never start less than the minimum interval apart,
/// no matter how many logical resolutions are in progress.
pub struct RateLimiter {
    /// Minimum delay between the start of two permitted calls
    min_interval: Duration,
    /// Start time of the last permitted call
    last_start: Mutex<Instant>,
}

impl RateLimiter {
    /// Create a rate limiter with the given minimum interval in milliseconds
    pub fn new(minimum_delay_ms: u64) -> Self {
        let min_interval = Duration::from_millis(minimum_delay_ms);
        RateLimiter {
            min_interval,
            // Backdate so the first call never waits
            last_start: Mutex::new(
                Instant::now()
                    .checked_sub(min_interval)
                    .unwrap_or_else(Instant::now),
            ),
        }
    }

    /// Block the current thread until the minimum interval since the start
    /// of the previous permitted call has elapsed, then record the new
    /// call's start time
    ///
    /// Callers are served in lock-acquisition order. This primitive cannot
    /// fail.
    pub fn await_turn(&self) {
        let mut last_start = self.last_start.lock();
        let elapsed = last_start.elapsed();
        if elapsed < self.min_interval {
            let wait = self.min_interval - elapsed;
            debug!("Rate limiting external call: sleeping for {} ms", wait.as_millis());
            // Sleeping with the lock held keeps waiting callers spaced
            std::thread::sleep(wait);
        }
        *last_start = Instant::now();
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
