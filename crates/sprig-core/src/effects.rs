//! Request-processing effects
//!
//! The HTTP layer is an external collaborator. Request computations reach it
//! only through [`RequestEffects`]: read the current request, write response
//! bytes, set the response status. Short-circuiting is expressed in the
//! return type ([`HandlerError::NotHandled`](crate::HandlerError::NotHandled)),
//! not as an effect.

use serde::{Deserialize, Serialize};

/// Origin addresses treated as the local machine.
pub const LOOPBACK_ADDRS: [&str; 3] = ["127.0.0.1", "localhost", "::1"];

/// The parts of an incoming request the core looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Address of the client the request came from.
    pub client_addr: String,
    /// Request path, without query string.
    pub path: String,
}

impl Request {
    /// Create a request for `path` from `client_addr`.
    pub fn new(client_addr: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            client_addr: client_addr.into(),
            path: path.into(),
        }
    }

    /// Whether the request originates from the local machine.
    pub fn is_local(&self) -> bool {
        is_localhost(&self.client_addr)
    }
}

/// Whether `addr` is one of the loopback identifiers.
pub fn is_localhost(addr: &str) -> bool {
    LOOPBACK_ADDRS.contains(&addr)
}

/// Request I/O offered by the HTTP collaborator.
pub trait RequestEffects {
    /// The request being processed.
    fn request(&self) -> &Request;

    /// Appends text to the response body.
    fn write_output(&mut self, text: &str);

    /// Sets the response status line.
    fn set_response_status(&mut self, status: u16, reason: &str);
}
