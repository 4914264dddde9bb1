use std::time::Duration;

use crate::context::{ContextError, ExecContext};
use crate::request::Request;

/// High-level classification of an error for retry purposes.
///
/// Callers map HTTP status codes and curl errors into these kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation timed out at the transport (connect/read), not the caller's budget.
    Timeout,
    /// Server asked us to slow down (e.g. 429, 503).
    Throttled,
    /// Network-level failure (connection reset, DNS, etc.).
    Connection,
    /// HTTP status that is retryable but not strictly throttling (5xx).
    Http5xx(u16),
    /// Any other error (typically not retried).
    Other,
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry this error.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Hook consulted by a request's retry loop after every failed attempt.
pub trait Retryer: Send + Sync {
    /// Whether another attempt should be made. May replace `req`'s error
    /// when it refuses.
    fn should_retry(&self, req: &mut Request) -> bool;

    /// Backoff to wait before the next attempt of `req`.
    fn retry_delay(&self, req: &Request) -> Duration;

    /// Sleep for the backoff. Implementations bound to a budget wake early
    /// and report the context error, which ends the call.
    fn wait(&self, delay: Duration) -> Result<(), ContextError> {
        std::thread::sleep(delay);
        Ok(())
    }

    /// Context this retryer is bound to, if any.
    fn context(&self) -> Option<&ExecContext> {
        None
    }
}

/// Simple exponential backoff policy with caps. This is the default policy
/// every request starts with.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    /// Base delay for backoff.
    pub base_delay: Duration,
    /// Upper bound on backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Compute the next backoff delay for a given attempt and error kind.
    ///
    /// `attempt` is 1-based (1 = first attempt). Returns `RetryDecision::NoRetry`
    /// when we should stop retrying.
    pub fn decide(&self, attempt: u32, kind: ErrorKind) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::NoRetry;
        }

        match kind {
            ErrorKind::Other => RetryDecision::NoRetry,
            ErrorKind::Timeout
            | ErrorKind::Connection
            | ErrorKind::Throttled
            | ErrorKind::Http5xx(_) => RetryDecision::RetryAfter(self.next_delay(attempt)),
        }
    }

    /// Backoff after `attempt` (1-based): base * 2^(attempt-1), capped.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let exp = 1u32.saturating_mul(1 << attempt.max(1).saturating_sub(1).min(8));
        let raw = self.base_delay.saturating_mul(exp);
        raw.min(self.max_delay)
    }

    /// Kind of the failure recorded on `req`, honouring the classifier's
    /// retryable flag when one was set.
    fn failure_kind(req: &Request) -> Option<ErrorKind> {
        match req.retryable() {
            Some(false) => None,
            Some(true) => Some(
                req.last_error()
                    .map(|e| e.kind())
                    .filter(|k| *k != ErrorKind::Other)
                    .unwrap_or(ErrorKind::Connection),
            ),
            None => {
                if let Some(e) = req.last_error() {
                    return Some(e.kind());
                }
                req.response()
                    .map(|r| super::classify_http_status(r.status()))
            }
        }
    }
}

impl Retryer for RetryPolicy {
    fn should_retry(&self, req: &mut Request) -> bool {
        let Some(kind) = Self::failure_kind(req) else {
            return false;
        };
        matches!(
            self.decide(req.attempt_count().max(1), kind),
            RetryDecision::RetryAfter(_)
        )
    }

    fn retry_delay(&self, req: &Request) -> Duration {
        self.next_delay(req.attempt_count())
    }
}
