//! Recording request double
//!
//! [`MockRequest`] stands in for the HTTP collaborator: it serves a fixed
//! request and records whatever the handler writes back.

use sprig_core::{Request, RequestEffects};

/// Address used for requests that must not count as local.
pub const REMOTE_ADDR: &str = "203.0.113.7";

/// In-memory [`RequestEffects`] that records the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    request: Request,
    body: String,
    status: Option<(u16, String)>,
}

impl MockRequest {
    /// A request for `path` from `client_addr`.
    pub fn new(client_addr: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request: Request::new(client_addr, path),
            body: String::new(),
            status: None,
        }
    }

    /// A request for `path` from the loopback address.
    pub fn local(path: impl Into<String>) -> Self {
        Self::new("127.0.0.1", path)
    }

    /// A request for `path` from a documentation-range public address.
    pub fn remote(path: impl Into<String>) -> Self {
        Self::new(REMOTE_ADDR, path)
    }

    /// Everything written to the response body so far.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The status code set by the handler, if any.
    pub fn status(&self) -> Option<u16> {
        self.status.as_ref().map(|(code, _)| *code)
    }

    /// The reason phrase set by the handler, if any.
    pub fn reason(&self) -> Option<&str> {
        self.status.as_ref().map(|(_, reason)| reason.as_str())
    }
}

impl RequestEffects for MockRequest {
    fn request(&self) -> &Request {
        &self.request
    }

    fn write_output(&mut self, text: &str) {
        self.body.push_str(text);
    }

    fn set_response_status(&mut self, status: u16, reason: &str) {
        self.status = Some((status, reason.to_string()));
    }
}
