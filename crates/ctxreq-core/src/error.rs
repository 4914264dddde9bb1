//! Error taxonomy surfaced to callers of the executor and the retry loop.

use std::sync::Arc;

use thiserror::Error;

use crate::context::ContextError;
use crate::retry::{classify_curl_error, classify_http_status, ErrorKind};

/// Raw failure of one transfer, before classification.
#[derive(Debug, Error)]
pub enum SendFailure {
    /// libcurl reported an error for the transfer.
    #[error("{error}")]
    Curl {
        #[source]
        error: curl::Error,
        /// Last HTTP status line seen before the failure, if any.
        status_line: Option<String>,
    },
    /// The multi stack itself failed (perform/wait/add/remove).
    #[error("curl multi: {0}")]
    Multi(#[from] curl::MultiError),
    /// The execution context fired while the transfer was in flight.
    #[error(transparent)]
    Interrupted(#[from] ContextError),
}

impl SendFailure {
    pub(crate) fn curl(error: curl::Error) -> Self {
        SendFailure::Curl {
            error,
            status_line: None,
        }
    }
}

/// Terminal error of a request (one logical call, possibly several attempts).
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    /// The caller's budget expired or was cancelled. Never retried.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// The next backoff interval would end after the deadline.
    #[error("deadline would exceed before next retry")]
    DeadlineWouldExceedBeforeRetry,
    /// Connection-level failure with no usable response.
    #[error("send request failed: {0}")]
    Transport(#[source] Arc<SendFailure>),
    /// The server answered with a non-2xx status.
    #[error("HTTP {code}")]
    Status { code: u32 },
    /// A next-page URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// A page body could not be decoded as JSON.
    #[error("decode response body: {0}")]
    Decode(#[source] Arc<serde_json::Error>),
    /// Pages were iterated on a request that has no response yet.
    #[error("request has no response")]
    NoResponse,
}

impl RequestError {
    pub(crate) fn transport(failure: SendFailure) -> Self {
        RequestError::Transport(Arc::new(failure))
    }

    /// The context error, when this is a budget expiry.
    pub fn context_error(&self) -> Option<ContextError> {
        match self {
            RequestError::Context(e) => Some(*e),
            _ => None,
        }
    }

    /// True for the two budget-related errors; callers treat both as "out of time".
    pub fn is_budget_error(&self) -> bool {
        matches!(
            self,
            RequestError::Context(_) | RequestError::DeadlineWouldExceedBeforeRetry
        )
    }

    /// Retry classification used by the default policy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Transport(failure) => match failure.as_ref() {
                SendFailure::Curl { error, .. } => classify_curl_error(error),
                SendFailure::Multi(_) => ErrorKind::Connection,
                SendFailure::Interrupted(_) => ErrorKind::Other,
            },
            RequestError::Status { code } => classify_http_status(*code),
            _ => ErrorKind::Other,
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(e: serde_json::Error) -> Self {
        RequestError::Decode(Arc::new(e))
    }
}
