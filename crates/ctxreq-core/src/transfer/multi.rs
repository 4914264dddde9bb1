//! Cancellable transfer: drive a single easy handle on a curl multi stack,
//! checking the execution context between perform/wait rounds.

use std::time::Duration;

use curl::multi::Multi;

use crate::context::ExecContext;
use crate::error::SendFailure;
use crate::request::{Request, Response};

use super::{failed, finish, prepare};

/// Upper bound on one wait round; also bounds how late a cancel() is seen.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Run one attempt of `req` until it completes or `ctx` fires, whichever is
/// first. A context that already fired stops the attempt before any I/O.
pub(crate) fn perform_cancellable(
    ctx: &ExecContext,
    req: &Request,
) -> Result<Response, SendFailure> {
    if let Some(e) = ctx.err() {
        return Err(SendFailure::Interrupted(e));
    }

    let easy = prepare(req).map_err(SendFailure::curl)?;
    let multi = Multi::new();
    let handle = multi.add2(easy)?;

    loop {
        if let Some(e) = ctx.err() {
            // Detaching the handle aborts the transfer and closes its connection.
            let _ = multi.remove2(handle);
            return Err(SendFailure::Interrupted(e));
        }
        let running = multi.perform()?;
        if running == 0 {
            break;
        }
        let wait = ctx
            .remaining()
            .map_or(POLL_INTERVAL, |r| r.min(POLL_INTERVAL));
        multi.wait(&mut [], wait)?;
    }

    let mut result = None;
    multi.messages(|msg| {
        if let Some(r) = msg.result_for2(&handle) {
            result = Some(r);
        }
    });
    let mut easy = multi.remove2(handle)?;
    match result {
        Some(Err(error)) => Err(failed(&mut easy, error)),
        _ => finish(&mut easy),
    }
}
