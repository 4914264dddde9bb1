//! Send step: how a single attempt is performed.

use crate::execute::classify;
use crate::transfer;

use super::Request;

/// Performs one attempt of a request and records the outcome on it
/// (response, error, retryable flag). Installed per request; the executor
/// swaps in a cancellable implementation.
pub trait SendStrategy: Send + Sync {
    fn send(&self, req: &mut Request);
}

/// Default send step: a plain curl easy transfer that runs to completion
/// (bounded only by the transport's own timeouts).
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockingSend;

impl SendStrategy for BlockingSend {
    fn send(&self, req: &mut Request) {
        let result = transfer::perform_blocking(req);
        let outcome = classify::apply(None, req, result);
        tracing::debug!(url = %req.url(), attempt = req.attempt_count(), ?outcome, "attempt finished");
    }
}
