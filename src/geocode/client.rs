//! Rate-limited, retrying access to the geocoding service.

use super::limiter::RateLimiter;
use super::transport::Transport;
use super::types::GeocodeError;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Retry behaviour for transient service failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 1,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Handle to the geocoding service shared by resolvers and lookups.
///
/// Cloning is cheap and keeps the same transport and rate limiter.
#[derive(Clone)]
pub struct GeocodeClient {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl GeocodeClient {
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            transport,
            limiter,
            retry,
        }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Issue one search. Each attempt, retries included, waits on the limiter.
    pub fn search(&self, params: &[(&str, &str)]) -> Result<serde_json::Value, GeocodeError> {
        let mut attempt = 0;
        loop {
            self.limiter.acquire();
            match self.transport.get_json(params) {
                Err(e) if e.is_retryable() && attempt < self.retry.retries => {
                    attempt += 1;
                    let backoff = self.retry.backoff * attempt;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        "transient geocoding failure, retrying"
                    );
                    thread::sleep(backoff);
                }
                other => return other,
            }
        }
    }
}
