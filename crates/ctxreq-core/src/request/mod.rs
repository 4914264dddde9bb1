//! Request/response object model and the per-request retry loop.
//!
//! A `Request` owns everything one logical call needs: target, headers,
//! transport settings, the send strategy that performs an attempt, and the
//! retryer consulted between attempts. `send()` runs attempts until one
//! succeeds or the retryer says stop.

mod paginate;
mod response;
mod send;

use std::sync::Arc;

use crate::error::RequestError;
use crate::retry::{RetryPolicy, Retryer};
use crate::transfer::TransferSettings;

pub use paginate::Paginator;
pub use response::Response;
pub use send::{BlockingSend, SendStrategy};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    #[default]
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// One logical call. Mutated in place by the send strategy, the response
/// validation step and the retryer; never shared across threads while in
/// flight.
pub struct Request {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    settings: TransferSettings,
    paginator: Option<Paginator>,
    strategy: Arc<dyn SendStrategy>,
    retryer: Arc<dyn Retryer>,
    attempt_count: u32,
    last_error: Option<RequestError>,
    retryable: Option<bool>,
    response: Option<Response>,
}

impl Request {
    /// Request with default transport settings, blocking send and the
    /// default retry policy.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            settings: TransferSettings::default(),
            paginator: None,
            strategy: Arc::new(BlockingSend),
            retryer: Arc::new(RetryPolicy::default()),
            attempt_count: 0,
            last_error: None,
            retryable: None,
            response: None,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_settings(mut self, settings: TransferSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = Some(paginator);
        self
    }

    pub fn with_retryer(mut self, retryer: Arc<dyn Retryer>) -> Self {
        self.retryer = retryer;
        self
    }

    /// Replace how a single attempt is performed.
    pub fn set_send_strategy(&mut self, strategy: Arc<dyn SendStrategy>) {
        self.strategy = strategy;
    }

    /// Replace the retryer consulted between attempts.
    pub fn set_retryer(&mut self, retryer: Arc<dyn Retryer>) {
        self.retryer = retryer;
    }

    pub fn retryer(&self) -> &Arc<dyn Retryer> {
        &self.retryer
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    pub fn paginator(&self) -> Option<&Paginator> {
        self.paginator.as_ref()
    }

    /// Attempts made so far in this logical call (1 after the first).
    pub fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    pub fn last_error(&self) -> Option<&RequestError> {
        self.last_error.as_ref()
    }

    /// Classifier verdict for the last failure; `None` leaves the decision
    /// to the retry policy's status table.
    pub fn retryable(&self) -> Option<bool> {
        self.retryable
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn set_attempt_count(&mut self, attempts: u32) {
        self.attempt_count = attempts;
    }

    pub fn set_last_error(&mut self, error: Option<RequestError>) {
        self.last_error = error;
    }

    pub fn set_retryable(&mut self, retryable: Option<bool>) {
        self.retryable = retryable;
    }

    pub fn set_response(&mut self, response: Option<Response>) {
        self.response = response;
    }

    /// Runs attempts until success or the retryer refuses another one.
    /// Returns the request's final error.
    pub fn send(&mut self) -> Result<(), RequestError> {
        loop {
            self.response = None;
            self.last_error = None;
            self.retryable = None;
            self.attempt_count += 1;

            let strategy = Arc::clone(&self.strategy);
            strategy.send(self);
            self.validate_response();

            let Some(err) = self.last_error.clone() else {
                return Ok(());
            };

            let retryer = Arc::clone(&self.retryer);
            if !retryer.should_retry(self) {
                let err = self.last_error.clone().unwrap_or(err);
                tracing::debug!(
                    method = self.method.as_str(),
                    url = %self.url,
                    attempt = self.attempt_count,
                    error = %err,
                    "request failed"
                );
                return Err(err);
            }

            let delay = retryer.retry_delay(self);
            tracing::debug!(
                method = self.method.as_str(),
                url = %self.url,
                attempt = self.attempt_count,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying request"
            );
            if let Err(e) = retryer.wait(delay) {
                // The budget ran out during backoff; no further attempt is made.
                tracing::debug!(
                    method = self.method.as_str(),
                    url = %self.url,
                    attempt = self.attempt_count,
                    error = %e,
                    "backoff interrupted"
                );
                let err = RequestError::Context(e);
                self.last_error = Some(err.clone());
                self.retryable = Some(false);
                return Err(err);
            }
        }
    }

    /// Turn a non-2xx response into the status error the retry policy reads.
    fn validate_response(&mut self) {
        if self.last_error.is_some() {
            return;
        }
        if let Some(resp) = &self.response {
            if !resp.is_success() {
                self.last_error = Some(RequestError::Status {
                    code: resp.status(),
                });
            }
        }
    }

    /// Fresh request for the same target with a different URL; carries the
    /// strategy and retryer but none of the previous attempt state.
    pub(crate) fn follow_up(&self, url: String) -> Self {
        Self {
            method: self.method,
            url,
            headers: self.headers.clone(),
            body: self.body.clone(),
            settings: self.settings.clone(),
            paginator: self.paginator.clone(),
            strategy: Arc::clone(&self.strategy),
            retryer: Arc::clone(&self.retryer),
            attempt_count: 0,
            last_error: None,
            retryable: None,
            response: None,
        }
    }
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("attempt_count", &self.attempt_count)
            .field("last_error", &self.last_error)
            .field("retryable", &self.retryable)
            .field("response", &self.response)
            .finish()
    }
}
