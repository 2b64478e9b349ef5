//! Minimum-interval rate limiter for calls to the geocoding service.
//!
//! Every resolver and lookup that talks to the same service holds a clone of one
//! `Arc<RateLimiter>`. The lock is held while sleeping, so concurrent callers are
//! serialised and the aggregate call rate never exceeds one call per interval.

use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

pub struct RateLimiter {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Block until a call is allowed, then record it.
    pub fn acquire(&self) {
        let mut last = self.last_call.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_call_does_not_wait() {
        let limiter = RateLimiter::new(Duration::from_secs(5));
        let start = Instant::now();
        limiter.acquire();
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_sequential_calls_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(40));
        let start = Instant::now();
        for _ in 0..4 {
            limiter.acquire();
        }
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn test_shared_across_threads() {
        let limiter = Arc::new(RateLimiter::new(Duration::from_millis(30)));
        let start = Instant::now();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || limiter.acquire())
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        // Four calls through one limiter: at least three full intervals.
        assert!(start.elapsed() >= Duration::from_millis(90));
    }
}
