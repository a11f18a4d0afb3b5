//! Client configuration.

use crate::error::{Error, Result};
use std::time::Duration;

/// Default API prefix prepended to every resource path.
pub const DEFAULT_API_PREFIX: &str = "/v1";

/// Client-wide settings.
///
/// # Example
///
/// ```
/// use invoice_kit::config::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig::default()
///     .with_timeout(Duration::from_secs(30))
///     .with_page_limit(100);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Path prefix, e.g. `/v1`.
    pub api_prefix: String,

    /// Upper bound for a single request, including the wait for the response.
    ///
    /// An elapsed timeout surfaces as [`Error::Timeout`] and is not retried:
    /// a timed out `pay` may still have been processed by the service.
    pub request_timeout: Option<Duration>,

    /// Page size sent with list requests that do not set their own `limit`.
    ///
    /// `None` lets the service choose.
    pub page_limit: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            request_timeout: None,
            page_limit: None,
        }
    }
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = Some(limit);
        self
    }

    pub fn with_api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self
    }

    /// Check the configuration before a client is built from it.
    ///
    /// # Errors
    /// Returns `Error::Config` for an empty prefix, a zero timeout or a zero page limit.
    pub fn validate(&self) -> Result<()> {
        if self.api_prefix.trim_matches('/').is_empty() {
            return Err(Error::Config("api_prefix must not be empty".to_string()));
        }
        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Error::Config("request_timeout must be positive".to_string()));
        }
        if self.page_limit == Some(0) {
            return Err(Error::Config("page_limit must be positive".to_string()));
        }
        Ok(())
    }
}
