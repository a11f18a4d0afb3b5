//! Error types for the invoice client.

use std::fmt;
use std::time::Duration;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the invoice client.
///
/// Every operation returns `Result<T>`. List iterators do not return errors
/// from `advance()`; they keep the first failure and expose it through
/// [`ListIter::err`](crate::list::ListIter::err).
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Request parameters are malformed or a required field is missing.
    ///
    /// Raised locally for missing required fields (customer, currency) and by
    /// the remote service for everything else (`invalid_request_error`).
    /// `param` names the offending parameter when the service reports one.
    Validation {
        message: String,
        param: Option<String>,
    },

    /// The referenced resource does not exist.
    NotFound(String),

    /// A payment attempt was declined.
    ///
    /// Returned by `pay`. **Never** retry this blindly: the caller owns the
    /// retry policy for anything that moves money.
    Payment {
        message: String,
        /// Service error code, e.g. `card_declined`.
        code: Option<String>,
        /// Issuer decline reason, e.g. `insufficient_funds`.
        decline_code: Option<String>,
    },

    /// The transport failed before a response was received.
    ///
    /// Common causes:
    /// - Connection refused or reset
    /// - No route registered in the in-memory transport
    Transport(String),

    /// The request did not complete within the configured timeout.
    ///
    /// The request may or may not have reached the service. It is not retried.
    Timeout(Duration),

    /// A response payload could not be decoded into the expected resource.
    Deserialization(String),

    /// Request parameters could not be encoded.
    Serialization(String),

    /// Any error payload that is not modelled by a more specific variant.
    RemoteService {
        status: u16,
        kind: Option<String>,
        message: String,
    },

    /// Invalid client configuration.
    Config(String),
}

impl Error {
    /// Shorthand for a locally raised validation error on `param`.
    pub fn missing(param: &str) -> Self {
        Error::Validation {
            message: format!("missing required param: {}", param),
            param: Some(param.to_string()),
        }
    }

    /// Whether this error was raised below the API layer (network, timeout, decoding).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_) | Error::Timeout(_) | Error::Deserialization(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Validation { message, param } => match param {
                Some(param) => write!(f, "Validation error ({}): {}", param, message),
                None => write!(f, "Validation error: {}", message),
            },
            Error::NotFound(msg) => write!(f, "Not found: {}", msg),
            Error::Payment {
                message,
                decline_code,
                ..
            } => match decline_code {
                Some(reason) => write!(f, "Payment error: {} ({})", message, reason),
                None => write!(f, "Payment error: {}", message),
            },
            Error::Transport(msg) => write!(f, "Transport error: {}", msg),
            Error::Timeout(after) => write!(f, "Timeout: no response after {:?}", after),
            Error::Deserialization(msg) => write!(f, "Deserialization error: {}", msg),
            Error::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            Error::RemoteService {
                status,
                kind,
                message,
            } => match kind {
                Some(kind) => write!(f, "Remote service error {} [{}]: {}", status, kind, message),
                None => write!(f, "Remote service error {}: {}", status, message),
            },
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ============================================================================
// Conversions from other error types
// ============================================================================

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        if e.is_io() {
            Error::Transport(e.to_string())
        } else {
            Error::Deserialization(e.to_string())
        }
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(e: serde_urlencoded::ser::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
