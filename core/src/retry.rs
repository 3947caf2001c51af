//! Retry combinator with exponential backoff, jitter and cancellation.
//!
//! Every attempt and every pause between attempts races the caller's
//! [`Context`], so a cancelled or timed-out request stops retrying at once.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{error, warn};

use crate::config::{
    KEY_FETCH_BACKOFF_MULTIPLIER, KEY_FETCH_MAX_ATTEMPTS, KEY_FETCH_MAX_DELAY, KEY_FETCH_MIN_DELAY,
};
use crate::context::{Context, ContextError};

/// Errors that know whether another attempt could succeed
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Backoff parameters for a retried operation.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Delay before the second attempt, and lower bound for every delay
    pub min_delay: Duration,
    /// Upper bound for every delay
    pub max_delay: Duration,
    /// Total attempts including the first (at least 1)
    pub max_attempts: u32,
    /// Growth factor applied to the delay after each failed attempt
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            min_delay: KEY_FETCH_MIN_DELAY,
            max_delay: KEY_FETCH_MAX_DELAY,
            max_attempts: KEY_FETCH_MAX_ATTEMPTS,
            backoff_multiplier: KEY_FETCH_BACKOFF_MULTIPLIER,
        }
    }
}

/// Why a retried operation gave up
#[derive(Debug)]
pub enum RetryError<E> {
    /// Every allowed attempt failed with a retryable error
    Exhausted { attempts: u32, last: E },
    /// An attempt failed with an error that is not worth retrying
    Permanent { attempts: u32, error: E },
    /// The context fired before the operation succeeded
    Interrupted {
        attempts: u32,
        reason: ContextError,
        last: Option<E>,
    },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. }
            | Self::Permanent { attempts, .. }
            | Self::Interrupted { attempts, .. } => *attempts,
        }
    }
}

impl RetryPolicy {
    pub fn new(min_delay: Duration, max_delay: Duration, max_attempts: u32) -> Self {
        Self {
            min_delay,
            max_delay,
            max_attempts,
            ..Default::default()
        }
    }

    /// Run `operation` until it succeeds, fails permanently, runs out of
    /// attempts, or `ctx` is done.
    pub async fn retry<F, Fut, T, E>(
        &self,
        ctx: &Context,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;
        let mut last: Option<E> = None;
        let mut delay = self.min_delay;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                reason = ctx.done() => {
                    return Err(RetryError::Interrupted { attempts: attempt, reason, last });
                }
                outcome = operation() => outcome,
            };

            let e = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if !e.is_retryable() {
                return Err(RetryError::Permanent {
                    attempts: attempt,
                    error: e,
                });
            }

            if attempt >= max_attempts {
                error!(
                    operation = %operation_name,
                    attempt = attempt,
                    error = %e,
                    "Operation failed after max retries"
                );
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    last: e,
                });
            }

            let pause = self.jittered(delay);
            warn!(
                operation = %operation_name,
                attempt = attempt,
                error = %e,
                delay_ms = pause.as_millis() as u64,
                "Operation failed, retrying"
            );
            last = Some(e);

            tokio::select! {
                biased;
                reason = ctx.done() => {
                    return Err(RetryError::Interrupted { attempts: attempt, reason, last });
                }
                _ = tokio::time::sleep(pause) => {}
            }

            delay = Duration::from_secs_f64(
                (delay.as_secs_f64() * self.backoff_multiplier).min(self.max_delay.as_secs_f64()),
            );
        }
    }

    /// 0.5x to 1.5x of `delay`, kept inside `[min_delay, max_delay]`
    fn jittered(&self, delay: Duration) -> Duration {
        let jitter = rand::thread_rng().gen_range(0.5..1.5);
        let jittered = Duration::from_secs_f64(delay.as_secs_f64() * jitter);
        jittered.clamp(self.min_delay, self.max_delay.max(self.min_delay))
    }
}
