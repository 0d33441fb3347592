//! Retry policy for collaborator calls
//!
//! Network collaborators are retried a fixed number of times. Running out
//! of attempts is returned to the caller as `TxoError::RetriesExhausted`;
//! whether that aborts the run is the caller's decision.

use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::{TxoError, TxoResult};

/// Attempts and delays between attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    /// Delay after the first failure
    pub base_delay_ms: u64,
    /// Upper bound on any single delay
    pub max_delay_ms: u64,
    /// Double the delay after each failure instead of keeping it fixed
    pub exponential: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, base_delay_ms: u64, max_delay_ms: u64, exponential: bool) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms: max_delay_ms.max(base_delay_ms),
            exponential,
        }
    }

    /// Same delay between every attempt
    pub fn fixed(max_attempts: usize, delay: Duration) -> Self {
        let ms = delay.as_millis() as u64;
        Self::new(max_attempts, ms, ms, false)
    }

    /// Single attempt, no sleeping. For tests and offline runs.
    pub fn no_retry() -> Self {
        Self::new(1, 0, 0, false)
    }

    pub fn delay_for(&self, attempt: usize) -> Duration {
        let delay = if self.exponential {
            let exp = 2_u64.saturating_pow(attempt as u32);
            self.base_delay_ms.saturating_mul(exp)
        } else {
            self.base_delay_ms
        };
        Duration::from_millis(delay.min(self.max_delay_ms))
    }

    /// Run `op` until it succeeds, a non-transient error occurs, or the
    /// attempts run out.
    pub fn run<T, F>(&self, operation: &str, mut op: F) -> TxoResult<T>
    where
        F: FnMut(usize) -> TxoResult<T>,
    {
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_transient() => return Err(err),
                Err(err) => {
                    attempt += 1;
                    tracing::warn!(
                        "{} failed ({}), attempt {}/{}",
                        operation,
                        err,
                        attempt,
                        self.max_attempts
                    );
                    if attempt >= self.max_attempts {
                        return Err(TxoError::RetriesExhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            last_error: err.to_string(),
                        });
                    }
                    let delay = self.delay_for(attempt - 1);
                    if !delay.is_zero() {
                        sleep(delay);
                    }
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fixed(5, Duration::from_secs(3))
    }
}
