//! curl transport: builds an easy handle from a `Request` and runs it either
//! to completion (blocking) or under an execution context (cancellable).

mod handler;
mod multi;
pub(crate) mod parse;

use std::time::Duration;

use curl::easy::{Easy2, List};

use crate::error::SendFailure;
use crate::request::{Method, Request, Response};

pub(crate) use handler::Collector;
pub(crate) use multi::perform_cancellable;

/// Per-attempt transport settings, independent of the caller's budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    pub connect_timeout: Duration,
    /// Hard cap on a single attempt enforced by curl. Its expiry is a
    /// transport timeout, not a budget expiry.
    pub timeout: Option<Duration>,
    pub max_redirects: u32,
    pub user_agent: Option<String>,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: None,
            max_redirects: 10,
            user_agent: None,
        }
    }
}

/// Configure an easy handle for one attempt of `req`.
fn prepare(req: &Request) -> Result<Easy2<Collector>, curl::Error> {
    let settings = req.settings();
    let mut easy = Easy2::new(Collector::default());
    easy.url(req.url())?;
    match req.method() {
        Method::Get => easy.get(true)?,
        Method::Head => easy.nobody(true)?,
        Method::Post => easy.post(true)?,
        other => easy.custom_request(other.as_str())?,
    }
    match req.body() {
        Some(body) => easy.post_fields_copy(body)?,
        None if req.method() == Method::Post => easy.post_field_size(0)?,
        None => {}
    }

    let mut list = List::new();
    for (k, v) in req.headers() {
        list.append(&format!("{}: {}", k.trim(), v.trim()))?;
    }
    if !req.headers().is_empty() {
        easy.http_headers(list)?;
    }

    easy.follow_location(true)?;
    easy.max_redirections(settings.max_redirects)?;
    easy.connect_timeout(settings.connect_timeout)?;
    if let Some(timeout) = settings.timeout {
        easy.timeout(timeout)?;
    }
    if let Some(ua) = &settings.user_agent {
        easy.useragent(ua)?;
    }
    Ok(easy)
}

/// Build the response from a finished transfer.
fn finish(easy: &mut Easy2<Collector>) -> Result<Response, SendFailure> {
    let code = easy.response_code().map_err(SendFailure::curl)?;
    let collected = easy.get_mut();
    Ok(Response::new(
        code,
        std::mem::take(&mut collected.headers),
        std::mem::take(&mut collected.body),
    ))
}

/// Failure of a transfer, keeping the last status line for classification.
/// Any partially received body is dropped here.
fn failed(easy: &mut Easy2<Collector>, error: curl::Error) -> SendFailure {
    let collected = easy.get_mut();
    let status_line = collected.status_line();
    collected.body = Vec::new();
    SendFailure::Curl { error, status_line }
}

/// Run one attempt on the calling thread until curl finishes.
pub(crate) fn perform_blocking(req: &Request) -> Result<Response, SendFailure> {
    let mut easy = prepare(req).map_err(SendFailure::curl)?;
    match easy.perform() {
        Ok(()) => finish(&mut easy),
        Err(error) => Err(failed(&mut easy, error)),
    }
}
