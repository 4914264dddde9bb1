//! Token-based pagination: the next-page token is read from the JSON body of
//! the current page and sent as a query parameter on the next request.

use serde_json::Value;
use url::Url;

use crate::error::RequestError;

use super::{Request, Response};

/// Where the continuation token lives on each side of the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    /// Query parameter that carries the token on the next request.
    pub input_token: String,
    /// JSON pointer (RFC 6901) to the token in the response body, e.g. `/next`.
    pub output_token: String,
}

impl Paginator {
    pub fn new(input_token: impl Into<String>, output_token: impl Into<String>) -> Self {
        Self {
            input_token: input_token.into(),
            output_token: output_token.into(),
        }
    }

    /// Token in `response`, or `None` on the last page. Missing, null and
    /// empty-string tokens all end the scan.
    pub fn token(&self, response: &Response) -> Result<Option<String>, RequestError> {
        let body: Value = response.json()?;
        let token = match body.pointer(&self.output_token) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Ok(token)
    }
}

/// `url` with `param` set to `value`, replacing any previous value.
fn with_query_param(url: &str, param: &str, value: &str) -> Result<String, RequestError> {
    let mut url = Url::parse(url)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != param)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(param, value);
    Ok(url.into())
}

impl Request {
    /// Request for the page after this one, or `None` when this is the last
    /// page (or the request is not paginated).
    pub fn next_page(&self) -> Result<Option<Request>, RequestError> {
        let (Some(paginator), Some(response)) = (&self.paginator, &self.response) else {
            return Ok(None);
        };
        let Some(token) = paginator.token(response)? else {
            return Ok(None);
        };
        let url = with_query_param(&self.url, &paginator.input_token, &token)?;
        Ok(Some(self.follow_up(url)))
    }

    /// Hands the current page and every following page to `on_page`, which
    /// receives the page plus an "is last" flag and returns whether to
    /// continue. The current page must already be sent; later pages are sent
    /// through this request's strategy and retryer. The first failure ends
    /// the scan; pages already handed out stay delivered.
    pub fn each_page<F>(&self, mut on_page: F) -> Result<(), RequestError>
    where
        F: FnMut(&Response, bool) -> bool,
    {
        let mut next = self.deliver_page(&mut on_page)?;
        let mut page_no = 1u32;
        while let Some(mut page) = next {
            page_no += 1;
            tracing::debug!(page = page_no, url = %page.url(), "fetching next page");
            page.send()?;
            next = page.deliver_page(&mut on_page)?;
        }
        Ok(())
    }

    fn deliver_page<F>(&self, on_page: &mut F) -> Result<Option<Request>, RequestError>
    where
        F: FnMut(&Response, bool) -> bool,
    {
        if let Some(e) = &self.last_error {
            return Err(e.clone());
        }
        let response = self.response.as_ref().ok_or(RequestError::NoResponse)?;
        let next = self.next_page()?;
        if !on_page(response, next.is_none()) {
            return Ok(None);
        }
        Ok(next)
    }
}
