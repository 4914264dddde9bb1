//! Deadline-aware execution of requests.
//!
//! `execute` binds a request's whole lifetime to an `ExecContext`: every
//! attempt runs on a cancellable transfer that stops as soon as the context
//! fires, and a budget expiry is recorded as the context's own error so it
//! is never retried. Unless the request's retryer already watches the same
//! context, it is wrapped in a `DeadlineRetryer` so backoff never overruns
//! the deadline either.

mod background;
pub mod classify;

use std::sync::Arc;

use crate::context::ExecContext;
use crate::error::RequestError;
use crate::request::{Request, Response, SendStrategy};
use crate::retry::DeadlineRetryer;
use crate::transfer;

pub use background::execute_async;
pub use classify::Outcome;

/// Send step that races the transfer against an execution context.
#[derive(Debug, Clone)]
pub struct CancellableSend {
    ctx: ExecContext,
}

impl CancellableSend {
    pub fn new(ctx: ExecContext) -> Self {
        Self { ctx }
    }
}

impl SendStrategy for CancellableSend {
    fn send(&self, req: &mut Request) {
        let result = transfer::perform_cancellable(&self.ctx, req);
        let outcome = classify::apply(Some(&self.ctx), req, result);
        tracing::debug!(
            url = %req.url(),
            attempt = req.attempt_count(),
            ?outcome,
            remaining_ms = self.ctx.remaining().map(|r| r.as_millis() as u64),
            "attempt finished"
        );
    }
}

/// Send `req` so that neither an attempt nor a backoff outlives `ctx`.
/// Returns the request's final error; the request keeps the response (or
/// placeholder) for inspection.
pub fn execute(ctx: &ExecContext, req: &mut Request) -> Result<(), RequestError> {
    req.set_send_strategy(Arc::new(CancellableSend::new(ctx.clone())));
    let gated = req
        .retryer()
        .context()
        .is_some_and(|bound| bound.shares_signal_with(ctx));
    if !gated {
        let gate = DeadlineRetryer::with_policy(ctx.clone(), Arc::clone(req.retryer()));
        req.set_retryer(Arc::new(gate));
    }
    req.send()
}

/// Execute the first page under `ctx`, then walk the remaining pages with
/// the same cancellable send step. `on_page` gets each page and whether it
/// is the last one, and returns whether to keep going.
pub fn execute_paginated<F>(
    ctx: &ExecContext,
    req: &mut Request,
    on_page: F,
) -> Result<(), RequestError>
where
    F: FnMut(&Response, bool) -> bool,
{
    execute(ctx, req)?;
    req.each_page(on_page)
}
