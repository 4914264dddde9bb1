//! Outcome classification of a single attempt.
//!
//! Every attempt lands in exactly one `Outcome`, and `apply` leaves the
//! request in a state the retry policy can read uniformly: budget expiry is
//! never retryable, transport failures always carry a (placeholder) response
//! and a retryable flag, and status failures carry the status.

use crate::context::ExecContext;
use crate::error::{RequestError, SendFailure};
use crate::request::{Request, Response};
use crate::retry::is_request_construction_error;
use crate::transfer::parse;

/// Category assigned to one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// 2xx response received.
    Success,
    /// The execution context fired during the attempt.
    BudgetExpired,
    /// No usable response; assumed transient.
    TransportError,
    /// A status was obtained, from a real response or recovered from a
    /// failed transfer. Retryability is left to the default policy.
    ProtocolStatusError(u32),
    /// The request itself is unusable (malformed URL, unsupported scheme).
    UnknownTerminal,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Category of a response that curl delivered without error.
pub fn classify_response(response: &Response) -> Outcome {
    if response.is_success() {
        Outcome::Success
    } else {
        Outcome::ProtocolStatusError(response.status())
    }
}

/// Category of a failed transfer.
///
/// Budget expiry is recognised only when the failure carries exactly the
/// context's own error; curl's own timeouts stay transport errors. A status
/// is recovered only from a failed redirect chain; a transfer that breaks
/// after any other status line is a transport error.
pub fn classify_failure(ctx: Option<&ExecContext>, failure: &SendFailure) -> Outcome {
    match failure {
        SendFailure::Interrupted(e) => {
            if ctx.and_then(ExecContext::err) == Some(*e) {
                Outcome::BudgetExpired
            } else {
                Outcome::UnknownTerminal
            }
        }
        SendFailure::Curl { error, status_line } => {
            if let Some(code) = redirect_status(error, status_line.as_deref()) {
                Outcome::ProtocolStatusError(code)
            } else if is_request_construction_error(error) {
                Outcome::UnknownTerminal
            } else {
                Outcome::TransportError
            }
        }
        SendFailure::Multi(_) => Outcome::TransportError,
    }
}

/// 3xx status of a transfer that failed while following redirects.
fn redirect_status(error: &curl::Error, status_line: Option<&str>) -> Option<u32> {
    if !error.is_too_many_redirects() {
        return None;
    }
    status_line
        .and_then(parse::status_from_line)
        .or_else(|| error.extra_description().and_then(parse::leading_status))
        .filter(|code| (300..400).contains(code))
}

/// Classify the result of one attempt and record it on `req`.
pub(crate) fn apply(
    ctx: Option<&ExecContext>,
    req: &mut Request,
    result: Result<Response, SendFailure>,
) -> Outcome {
    let failure = match result {
        Ok(response) => {
            let outcome = classify_response(&response);
            req.set_response(Some(response));
            return outcome;
        }
        Err(failure) => failure,
    };

    let outcome = classify_failure(ctx, &failure);
    match outcome {
        Outcome::BudgetExpired => {
            if let SendFailure::Interrupted(e) = failure {
                req.set_last_error(Some(RequestError::Context(e)));
            }
            req.set_retryable(Some(false));
        }
        Outcome::ProtocolStatusError(code) => {
            // Validation turns the status into the error the policy reads.
            req.set_response(Some(Response::placeholder(code)));
        }
        Outcome::TransportError => {
            req.set_response(Some(Response::placeholder(0)));
            req.set_last_error(Some(RequestError::transport(failure)));
            req.set_retryable(Some(true));
        }
        Outcome::UnknownTerminal => {
            req.set_response(Some(Response::placeholder(0)));
            req.set_last_error(Some(RequestError::transport(failure)));
            req.set_retryable(Some(false));
        }
        Outcome::Success => {}
    }
    outcome
}
