//! Transport adapters.
//!
//! The client never speaks HTTP itself. Signing, connection handling and
//! body framing belong to a [`Transport`] implementation supplied by the
//! caller; the crate only builds [`Request`]s and decodes [`Response`]s.

use crate::error::Result;
use crate::params::Params;
use std::fmt;

#[cfg(feature = "inmemory")]
pub mod inmemory;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryTransport;

/// Request method.
///
/// `Get` is used for every side-effect-free call (reads, lists, invoice
/// preview) and may be repeated safely. `Post` and `Delete` mutate state and
/// are sent exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// A request ready to be signed and sent.
///
/// For `Get` the params are the query string, otherwise the form body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub params: Params,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>, params: Params) -> Self {
        Request {
            method,
            path: path.into(),
            params,
        }
    }
}

/// Raw decoded response: status code plus JSON payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status: u16,
    pub payload: serde_json::Value,
}

impl Response {
    pub fn ok(payload: serde_json::Value) -> Self {
        Response {
            status: 200,
            payload,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Trait for transport implementations.
///
/// **IMPORTANT:** `execute` takes `&self`; one transport is shared by every
/// clone of a [`Client`](crate::client::Client). Implementations must not
/// retry non-idempotent requests on their own.
///
/// **ASYNC:** All methods are async and must be awaited.
#[allow(async_fn_in_trait)]
pub trait Transport: Send + Sync + Clone {
    /// Send one request and return the service's answer.
    ///
    /// # Returns
    /// - `Ok(response)` for any answer from the service, including error
    ///   statuses (the client maps those to [`Error`](crate::Error) variants)
    ///
    /// # Errors
    /// Returns `Err` only when no answer was obtained (connection lost, etc.)
    async fn execute(&self, request: Request) -> Result<Response>;
}
