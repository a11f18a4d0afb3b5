//! Client core: request dispatch shared by every resource client.
//!
//! [`Client`] owns the transport, the configuration and the metrics sink. It
//! is cheap to clone; clones share all three. Resource-specific operations
//! live on [`InvoiceClient`] and [`InvoiceItemClient`], obtained from
//! [`Client::invoices`] and [`Client::invoice_items`].
//!
//! Every request is sent exactly once. There is no retry at this layer, in
//! particular not for `pay`: a duplicate payment attempt is worse than a
//! surfaced error, and the caller is the only one who can tell them apart.

use crate::codec::{self, Page};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::invoice::InvoiceClient;
use crate::invoice_item::InvoiceItemClient;
use crate::observability::{ClientMetrics, NoOpMetrics};
use crate::params::Params;
use crate::path::PathBuilder;
use crate::transport::{Method, Request, Response, Transport};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;

/// Transport-agnostic API client.
///
/// # Example
///
/// ```ignore
/// use invoice_kit::{Client, transport::InMemoryTransport};
///
/// let client = Client::new(InMemoryTransport::new());
///
/// // Clones share the transport and configuration
/// let invoices = client.invoices();
/// let items = client.clone().invoice_items();
/// ```
#[derive(Clone)]
pub struct Client<T: Transport> {
    transport: T,
    config: Arc<ClientConfig>,
    metrics: Arc<dyn ClientMetrics>,
}

impl<T: Transport> Client<T> {
    /// Create a client with the default configuration.
    pub fn new(transport: T) -> Self {
        Client {
            transport,
            config: Arc::new(ClientConfig::default()),
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Create a client with a custom configuration.
    ///
    /// # Errors
    /// Returns `Error::Config` if the configuration does not validate.
    pub fn with_config(transport: T, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Client {
            transport,
            config: Arc::new(config),
            metrics: Arc::new(NoOpMetrics),
        })
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn ClientMetrics>) -> Self {
        self.metrics = Arc::from(metrics);
        self
    }

    /// Invoice operations.
    pub fn invoices(&self) -> InvoiceClient<T> {
        InvoiceClient::new(self.clone())
    }

    /// Invoice item operations.
    pub fn invoice_items(&self) -> InvoiceItemClient<T> {
        InvoiceItemClient::new(self.clone())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn paths(&self) -> PathBuilder<'_> {
        PathBuilder::new(&self.config.api_prefix)
    }

    /// Send one request and return the raw response, whatever its status.
    ///
    /// # Errors
    ///
    /// - `Error::Timeout`: the configured request timeout elapsed
    /// - `Error::Transport`: the transport could not obtain a response
    pub(crate) async fn send(&self, method: Method, path: &str, params: Params) -> Result<Response> {
        let timer = Instant::now();
        debug!("» {} {} ({} params)", method, path, params.len());

        let request = Request::new(method, path, params);
        let outcome = match self.config.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.execute(request))
                .await
                .unwrap_or(Err(Error::Timeout(limit))),
            None => self.transport.execute(request).await,
        };

        let response = outcome.map_err(|e| {
            self.metrics.record_error(method, path, &e);
            e
        })?;

        self.metrics
            .record_request(method, path, response.status, timer.elapsed());
        Ok(response)
    }

    /// Send one request and decode the response as `R`.
    ///
    /// # Errors
    ///
    /// Everything [`Client::send`] returns, plus:
    ///
    /// - `Error::Validation`, `Error::NotFound`, `Error::Payment`,
    ///   `Error::RemoteService`: the service answered with an error status
    /// - `Error::Deserialization`: the payload does not decode as `R`
    pub(crate) async fn call<R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: Params,
    ) -> Result<R> {
        let response = self.send(method, path, params).await?;
        codec::decode_response(response).map_err(|e| {
            self.metrics.record_error(method, path, &e);
            e
        })
    }

    /// Fetch and decode one list page.
    pub(crate) async fn fetch_page<R: DeserializeOwned>(
        &self,
        path: &str,
        params: Params,
    ) -> Result<Page<R>> {
        let page: Page<R> = self.call(Method::Get, path, params).await?;
        self.metrics
            .record_page(path, page.len(), page.meta.has_more);
        Ok(page)
    }
}
