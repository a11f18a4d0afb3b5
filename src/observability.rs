//! Observability hooks for client requests.
//!
//! Implement [`ClientMetrics`] to feed request timings and failures into your
//! monitoring system:
//!
//! ```ignore
//! use invoice_kit::observability::ClientMetrics;
//! use invoice_kit::transport::Method;
//! use std::time::Duration;
//!
//! struct PrometheusMetrics;
//!
//! impl ClientMetrics for PrometheusMetrics {
//!     fn record_request(&self, method: Method, path: &str, status: u16, duration: Duration) {
//!         // histogram!("billing_request_seconds").record(duration);
//!     }
//! }
//!
//! // let client = Client::new(transport).with_metrics(Box::new(PrometheusMetrics));
//! ```
//!
//! The default is [`NoOpMetrics`]. [`LogMetrics`] uses the trait's default
//! methods, which log through the `log` crate.
//!
//! Hooks:
//! - `record_request()` - a response arrived (any status) with its latency
//! - `record_error()` - an operation failed, with the error
//! - `record_page()` - a list page was decoded, with its element count

use crate::error::Error;
use crate::transport::Method;
use std::time::Duration;

/// Trait for request metrics collection.
pub trait ClientMetrics: Send + Sync {
    /// Record a completed request.
    fn record_request(&self, method: Method, path: &str, status: u16, duration: Duration) {
        debug!("{} {} -> {} in {:?}", method, path, status, duration);
    }

    /// Record a failed operation.
    fn record_error(&self, method: Method, path: &str, error: &Error) {
        warn!("{} {} failed: {}", method, path, error);
    }

    /// Record a decoded list page.
    fn record_page(&self, path: &str, items: usize, has_more: bool) {
        debug!("Page {}: {} items (has_more: {})", path, items, has_more);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl ClientMetrics for NoOpMetrics {
    fn record_request(&self, _method: Method, _path: &str, _status: u16, _duration: Duration) {}
    fn record_error(&self, _method: Method, _path: &str, _error: &Error) {}
    fn record_page(&self, _path: &str, _items: usize, _has_more: bool) {}
}

/// Metrics implementation that only logs.
#[derive(Clone, Default)]
pub struct LogMetrics;

impl ClientMetrics for LogMetrics {}
