//! # invoice-kit
//!
//! A typed, transport-agnostic client for invoice, invoice item and invoice
//! line resources of a payment API.
//!
//! ## Features
//!
//! - **Typed resources:** `Invoice`, `InvoiceItem` and `InvoiceLine` decode from the service's JSON
//! - **Lazy pagination:** [`ListIter`] fetches one page at a time, cursor handled for you
//! - **Structured filters:** `field[op]=value` comparisons built with [`Filters`]
//! - **Pluggable transport:** implement [`Transport`] for HTTP, or use the scripted in-memory one in tests
//! - **No hidden retries:** every operation is one request, `pay` included
//!
//! ## Quick Start
//!
//! ```ignore
//! use invoice_kit::{Client, FilterOp};
//! use invoice_kit::invoice::{Billing, InvoiceListParams, InvoiceParams};
//! use invoice_kit::invoice_item::InvoiceItemParams;
//!
//! let client = Client::new(my_http_transport);
//!
//! // 1. Add a pending charge
//! client
//!     .invoice_items()
//!     .create(&InvoiceItemParams::new("cus_1", 100, "usd"))
//!     .await?;
//!
//! // 2. Invoice it
//! let invoice = client
//!     .invoices()
//!     .create(&InvoiceParams::new("cus_1").with_tax_percent(20.0))
//!     .await?;
//! assert_eq!(invoice.amount, invoice.subtotal + invoice.tax);
//!
//! // 3. Walk every emailed invoice due after a date
//! let params = InvoiceListParams::for_customer("cus_1")
//!     .with_billing(Billing::SendInvoice)
//!     .due_date(FilterOp::Gt, 1_500_000_000);
//! let mut iter = client.invoices().list(&params);
//! while iter.advance().await {
//!     if let Some(invoice) = iter.current() {
//!         println!("{} due {:?}", invoice.id, invoice.due_date);
//!     }
//! }
//! if let Some(err) = iter.err() {
//!     return Err(err.clone());
//! }
//! ```

#[macro_use]
extern crate log;

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod intent;
pub mod invoice;
pub mod invoice_item;
pub mod list;
pub mod observability;
pub mod params;
pub mod path;
pub mod resource;
pub mod transport;

// Re-exports for convenience
pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use intent::CloseIntent;
pub use invoice::{Invoice, InvoiceClient, InvoiceLine};
pub use invoice_item::{InvoiceItem, InvoiceItemClient};
pub use list::ListIter;
pub use params::{FilterOp, Filters, ListParams};
pub use resource::ApiResource;
pub use transport::Transport;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
