//! In-memory scripted transport (default feature, thread-safe, async).
//!
//! Responses are queued per `(method, path)` and handed out in FIFO order.
//! Every request is recorded so tests can assert on what was sent.

use super::{Method, Request, Response, Transport};
use crate::error::{Error, Result};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type RouteKey = (Method, String);

/// Thread-safe scripted transport for tests and demos.
///
/// A request with no queued response fails with [`Error::Transport`], which
/// makes unexpected calls visible instead of silently succeeding.
///
/// # Example
///
/// ```no_run
/// use invoice_kit::transport::{InMemoryTransport, Method, Request, Transport};
/// use invoice_kit::params::Params;
/// use serde_json::json;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let transport = InMemoryTransport::new();
///     transport.enqueue_json(Method::Get, "/v1/invoices/in_1", 200, json!({"id": "in_1"}));
///
///     let response = transport
///         .execute(Request::new(Method::Get, "/v1/invoices/in_1", Params::new()))
///         .await?;
///     assert_eq!(response.payload["id"], "in_1");
///     Ok(())
/// }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    routes: Arc<DashMap<RouteKey, VecDeque<Result<Response>>>>,
    requests: Arc<Mutex<Vec<Request>>>,
    latency: Option<Duration>,
}

impl InMemoryTransport {
    /// Create a transport with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency` (used to exercise timeouts).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queue a response or a transport failure for `method path`.
    pub fn enqueue(&self, method: Method, path: &str, outcome: Result<Response>) {
        self.routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(outcome);
    }

    /// Queue a JSON response with the given status.
    pub fn enqueue_json(&self, method: Method, path: &str, status: u16, payload: serde_json::Value) {
        self.enqueue(method, path, Ok(Response { status, payload }));
    }

    /// Number of responses still queued for `method path`.
    pub fn pending(&self, method: Method, path: &str) -> usize {
        self.routes
            .get(&(method, path.to_string()))
            .map(|queue| queue.len())
            .unwrap_or(0)
    }

    /// All requests received so far, in order.
    pub async fn requests(&self) -> Vec<Request> {
        self.requests.lock().await.clone()
    }

    pub async fn request_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

impl Transport for InMemoryTransport {
    async fn execute(&self, request: Request) -> Result<Response> {
        let key = (request.method, request.path.clone());
        self.requests.lock().await.push(request);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let outcome = self
            .routes
            .get_mut(&key)
            .and_then(|mut queue| queue.pop_front());

        match outcome {
            Some(outcome) => {
                debug!("✓ InMemory {} {} -> scripted", key.0, key.1);
                outcome
            }
            None => {
                warn!("⚠ InMemory {} {} -> no scripted response", key.0, key.1);
                Err(Error::Transport(format!(
                    "no scripted response for {} {}",
                    key.0, key.1
                )))
            }
        }
    }
}
