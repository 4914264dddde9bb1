use serde::de::DeserializeOwned;

use crate::error::RequestError;

/// Response of one attempt: status, raw header lines and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: u32,
    headers: Vec<String>,
    body: Vec<u8>,
    synthesized: bool,
}

impl Response {
    pub fn new(status: u32, headers: Vec<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
            synthesized: false,
        }
    }

    /// Stand-in built when no real response was received: just a status
    /// (0 when unknown) and an empty body.
    pub(crate) fn placeholder(status: u32) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            synthesized: true,
        }
    }

    pub fn status(&self) -> u32 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for placeholders built by the outcome classifier.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }

    /// Raw header lines of the final response, status line first.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// First value of header `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}
