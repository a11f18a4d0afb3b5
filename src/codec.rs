//! Mapping between service payloads and typed resources.
//!
//! # Payload shapes
//!
//! A single resource is a JSON object. A list is an envelope:
//!
//! ```text
//! {
//!   "object": "list",
//!   "data": [ {...}, {...} ],   // ordered as the service returns them
//!   "has_more": true,           // another page exists after the last element
//!   "total_count": 42,          // optional, only when requested
//!   "url": "/v1/invoices"
//! }
//! ```
//!
//! An error is `{"error": {"type", "message", "code", "decline_code", "param"}}`
//! with a non-2xx status.
//!
//! # Error mapping
//!
//! | Status / type | Error |
//! |---------------|-------|
//! | 402 or `card_error` | [`Error::Payment`] |
//! | 404 or `resource_missing` | [`Error::NotFound`] |
//! | 400 / 422 | [`Error::Validation`] |
//! | anything else | [`Error::RemoteService`] |

use crate::error::{Error, Result};
use crate::transport::Response;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Pagination metadata of the most recently fetched page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListMeta {
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub total_count: Option<u64>,
    #[serde(default)]
    pub url: String,
}

/// One page of a list envelope.
///
/// Also used for lists embedded in a resource, such as an invoice's lines.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(bound(deserialize = "R: DeserializeOwned"))]
pub struct Page<R> {
    #[serde(default = "Vec::new")]
    pub data: Vec<R>,
    #[serde(flatten)]
    pub meta: ListMeta,
}

impl<R> Default for Page<R> {
    fn default() -> Self {
        Page {
            data: Vec::new(),
            meta: ListMeta::default(),
        }
    }
}

impl<R> Page<R> {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
    code: Option<String>,
    decline_code: Option<String>,
    param: Option<String>,
}

/// Decode a single resource payload.
///
/// # Errors
/// Returns `Error::Deserialization` naming the target type on mismatch.
pub fn decode<R: DeserializeOwned>(payload: serde_json::Value) -> Result<R> {
    serde_json::from_value(payload).map_err(|e| {
        Error::Deserialization(format!("{}: {}", std::any::type_name::<R>(), e))
    })
}

/// Decode a list envelope.
pub fn decode_page<R: DeserializeOwned>(payload: serde_json::Value) -> Result<Page<R>> {
    decode(payload)
}

/// Turn a response into a resource, or into the matching error.
pub fn decode_response<R: DeserializeOwned>(response: Response) -> Result<R> {
    if response.is_success() {
        decode(response.payload)
    } else {
        Err(decode_error(response.status, response.payload))
    }
}

/// Map an error payload to the crate's taxonomy.
pub fn decode_error(status: u16, payload: serde_json::Value) -> Error {
    let body = match serde_json::from_value::<ErrorEnvelope>(payload.clone()) {
        Ok(envelope) => envelope.error,
        Err(_) => {
            return Error::RemoteService {
                status,
                kind: None,
                message: payload.to_string(),
            }
        }
    };

    let message = body
        .message
        .unwrap_or_else(|| format!("request failed with status {}", status));

    if status == 402 || body.kind.as_deref() == Some("card_error") {
        return Error::Payment {
            message,
            code: body.code,
            decline_code: body.decline_code,
        };
    }

    if status == 404 || body.code.as_deref() == Some("resource_missing") {
        return Error::NotFound(message);
    }

    match status {
        400 | 422 => Error::Validation {
            message,
            param: body.param,
        },
        _ => Error::RemoteService {
            status,
            kind: body.kind,
            message,
        },
    }
}
