//! Easy2 handler that collects the response of one attempt.

use std::str;

/// Collects header lines and body of a transfer. When redirects are
/// followed only the final response's headers are kept.
#[derive(Debug, Default)]
pub(crate) struct Collector {
    pub(super) headers: Vec<String>,
    pub(super) body: Vec<u8>,
}

impl Collector {
    /// Status line of the most recent response seen, if any.
    pub(super) fn status_line(&self) -> Option<String> {
        self.headers
            .first()
            .filter(|line| line.starts_with("HTTP/"))
            .cloned()
    }
}

impl curl::easy::Handler for Collector {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            let line = s.trim_end();
            if line.starts_with("HTTP/") {
                self.headers.clear();
                self.body.clear();
            }
            if !line.is_empty() {
                self.headers.push(line.to_string());
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, curl::easy::WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}
