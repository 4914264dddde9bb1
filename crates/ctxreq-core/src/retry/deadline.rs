//! Retry gate bound to an execution context.
//!
//! Wraps the default policy and refuses any retry that cannot finish inside
//! the caller's budget: either the context already fired, or the backoff
//! before the next attempt would end after the deadline. Otherwise the
//! default policy decides.

use std::sync::Arc;
use std::time::Duration;

use crate::context::{ContextError, ExecContext};
use crate::error::RequestError;
use crate::request::Request;

use super::policy::{RetryPolicy, Retryer};

/// `Retryer` that honours an `ExecContext`'s deadline. Holds no mutable
/// state; safe to share across threads for the lifetime of its context.
#[derive(Clone)]
pub struct DeadlineRetryer {
    ctx: ExecContext,
    policy: Arc<dyn Retryer>,
}

impl DeadlineRetryer {
    /// Gate around the default `RetryPolicy`.
    pub fn new(ctx: ExecContext) -> Self {
        Self::with_policy(ctx, Arc::new(RetryPolicy::default()))
    }

    /// Gate around a caller-supplied default policy.
    pub fn with_policy(ctx: ExecContext, policy: Arc<dyn Retryer>) -> Self {
        Self { ctx, policy }
    }
}

/// A retry whose backoff ends exactly at the deadline is still allowed;
/// only a delay that overshoots the remaining budget is refused.
pub(crate) fn fits_in_budget(remaining: Duration, delay: Duration) -> bool {
    remaining >= delay
}

impl Retryer for DeadlineRetryer {
    fn should_retry(&self, req: &mut Request) -> bool {
        if let Some(e) = self.ctx.err() {
            req.set_last_error(Some(RequestError::Context(e)));
            return false;
        }

        if let Some(remaining) = self.ctx.remaining() {
            let delay = self.policy.retry_delay(req);
            if !fits_in_budget(remaining, delay) {
                tracing::warn!(
                    attempt = req.attempt_count(),
                    delay_ms = delay.as_millis() as u64,
                    remaining_ms = remaining.as_millis() as u64,
                    "retry refused: backoff would outlast the deadline"
                );
                req.set_last_error(Some(RequestError::DeadlineWouldExceedBeforeRetry));
                return false;
            }
        }

        self.policy.should_retry(req)
    }

    fn retry_delay(&self, req: &Request) -> Duration {
        self.policy.retry_delay(req)
    }

    fn wait(&self, delay: Duration) -> Result<(), ContextError> {
        match self.ctx.wait(delay) {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn context(&self) -> Option<&ExecContext> {
        Some(&self.ctx)
    }
}

impl std::fmt::Debug for DeadlineRetryer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeadlineRetryer")
            .field("ctx", &self.ctx)
            .field("policy", &"<retryer>")
            .finish()
    }
}
