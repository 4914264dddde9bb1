//! Retry and backoff policy.
//!
//! This module holds error classification (timeouts, throttling, connection
//! failures), the default exponential backoff policy every request starts
//! with, and the deadline-aware gate that wraps it.

mod classify;
mod deadline;
mod policy;

pub use classify::{classify_curl_error, classify_http_status, is_request_construction_error};
pub use deadline::DeadlineRetryer;
pub use policy::{ErrorKind, RetryDecision, RetryPolicy, Retryer};
