//! Deadline-aware execution layer for outbound HTTP requests.
//!
//! Binds a request's whole lifetime (network I/O, error classification and
//! retry decisions) to an [`ExecContext`]: attempts abort as soon as the
//! caller's budget is gone, budget expiry is never retried, and a retry is
//! only scheduled when its backoff fits in what is left of the budget.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod execute;
pub mod logging;
pub mod request;
pub mod retry;
pub mod transfer;

pub use client::Client;
pub use context::{ContextError, ExecContext};
pub use error::{RequestError, SendFailure};
pub use execute::{execute, execute_async, execute_paginated, CancellableSend, Outcome};
pub use request::{Method, Paginator, Request, Response};
pub use retry::{DeadlineRetryer, RetryPolicy, Retryer};
