//! Invoices and their lines.
//!
//! Amounts are integer minor units. The service computes every derived figure:
//!
//! ```text
//! subtotal = sum(line.amount)
//! tax      = round(subtotal * tax_percent / 100)
//! amount   = subtotal + tax        (wire name: amount_due)
//! ```
//!
//! The client decodes these values and never recomputes them.
//!
//! # Lifecycle
//!
//! `closed` and `paid` are independent. Closing stops further items from being
//! attached and can be undone with [`CloseIntent::Reopen`]; paying is terminal.

use crate::client::Client;
use crate::codec::Page;
use crate::error::{Error, Result};
use crate::intent::CloseIntent;
use crate::list::ListIter;
use crate::params::{FilterOp, ListParams, Params};
use crate::resource::{
    expandable_id, null_as_default, optional_expandable_id, ApiResource, Period,
};
use crate::transport::{Method, Transport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const RESOURCE: &str = "invoices";

// ============================================================================
// Resources
// ============================================================================

/// How an invoice is collected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Billing {
    /// Charge the customer's default source when the invoice is finalized.
    #[default]
    ChargeAutomatically,
    /// Email the invoice for manual payment by `due_date`.
    SendInvoice,
}

impl Billing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Billing::ChargeAutomatically => "charge_automatically",
            Billing::SendInvoice => "send_invoice",
        }
    }
}

impl fmt::Display for Billing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Origin of an invoice line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    #[serde(rename = "invoiceitem")]
    InvoiceItem,
    #[serde(rename = "subscription")]
    Subscription,
}

/// A read-only entry of an invoice.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct InvoiceLine {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: LineType,
    #[serde(default)]
    pub period: Period,
    #[serde(default)]
    pub discountable: bool,
    #[serde(default)]
    pub proration: bool,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default, deserialize_with = "optional_expandable_id")]
    pub subscription: Option<String>,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ApiResource for InvoiceLine {
    fn id(&self) -> &str {
        &self.id
    }

    fn object_name() -> &'static str {
        "line_item"
    }
}

/// A billable statement for one customer.
///
/// A preview returned by [`InvoiceClient::preview_next`] is not persisted and
/// has an empty `id`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Invoice {
    #[serde(default)]
    pub id: String,
    #[serde(deserialize_with = "expandable_id")]
    pub customer: String,
    #[serde(default, deserialize_with = "optional_expandable_id")]
    pub subscription: Option<String>,

    /// Total due, `subtotal + tax`.
    #[serde(rename = "amount_due")]
    pub amount: i64,
    pub subtotal: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tax: i64,
    #[serde(default)]
    pub tax_percent: Option<f64>,
    pub total: i64,
    pub currency: String,

    #[serde(default)]
    pub billing: Billing,
    #[serde(default)]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub forgiven: bool,
    #[serde(default)]
    pub attempted: bool,
    #[serde(default)]
    pub attempt_count: u32,

    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub period_start: i64,
    #[serde(default)]
    pub period_end: i64,

    /// First page of lines, embedded in the invoice payload.
    #[serde(default, deserialize_with = "null_as_default")]
    pub lines: Page<InvoiceLine>,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub statement_descriptor: Option<String>,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub starting_balance: i64,
    #[serde(default)]
    pub ending_balance: Option<i64>,
    #[serde(default)]
    pub next_payment_attempt: Option<i64>,
    #[serde(default)]
    pub receipt_number: Option<String>,
}

impl ApiResource for Invoice {
    fn id(&self) -> &str {
        &self.id
    }

    fn object_name() -> &'static str {
        "invoice"
    }
}

// ============================================================================
// Request parameters
// ============================================================================

/// Parameters for creating an invoice.
///
/// Omitting `billing` leaves the choice to the service, which defaults to
/// `charge_automatically`. A `due_date` only makes sense with `send_invoice`;
/// the service rejects the other combination.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceParams {
    pub customer: String,
    pub billing: Option<Billing>,
    pub due_date: Option<i64>,
    pub days_until_due: Option<u32>,
    pub tax_percent: Option<f64>,
    pub description: Option<String>,
    pub statement_descriptor: Option<String>,
    pub subscription: Option<String>,
    pub application_fee: Option<i64>,
    pub metadata: BTreeMap<String, String>,
}

impl InvoiceParams {
    pub fn new(customer: impl Into<String>) -> Self {
        InvoiceParams {
            customer: customer.into(),
            ..Default::default()
        }
    }

    pub fn with_billing(mut self, billing: Billing) -> Self {
        self.billing = Some(billing);
        self
    }

    pub fn with_due_date(mut self, due_date: i64) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_tax_percent(mut self, tax_percent: f64) -> Self {
        self.tax_percent = Some(tax_percent);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push("customer", &self.customer)
            .push_opt("billing", self.billing)
            .push_opt("due_date", self.due_date)
            .push_opt("days_until_due", self.days_until_due)
            .push_opt("tax_percent", self.tax_percent)
            .push_opt("description", self.description.as_deref())
            .push_opt("statement_descriptor", self.statement_descriptor.as_deref())
            .push_opt("subscription", self.subscription.as_deref())
            .push_opt("application_fee", self.application_fee)
            .push_metadata(&self.metadata);
        params
    }
}

/// Partial update of an invoice. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceUpdate {
    pub close: CloseIntent,
    pub description: Option<String>,
    pub statement_descriptor: Option<String>,
    pub tax_percent: Option<f64>,
    pub forgiven: Option<bool>,
    pub due_date: Option<i64>,
    pub metadata: BTreeMap<String, String>,
}

impl InvoiceUpdate {
    pub fn close() -> Self {
        InvoiceUpdate {
            close: CloseIntent::Close,
            ..Default::default()
        }
    }

    pub fn reopen() -> Self {
        InvoiceUpdate {
            close: CloseIntent::Reopen,
            ..Default::default()
        }
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        self.close.append_to(&mut params);
        params
            .push_opt("description", self.description.as_deref())
            .push_opt("statement_descriptor", self.statement_descriptor.as_deref())
            .push_opt("tax_percent", self.tax_percent)
            .push_opt("forgiven", self.forgiven)
            .push_opt("due_date", self.due_date)
            .push_metadata(&self.metadata);
        params
    }
}

/// Parameters for paying an invoice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvoicePayParams {
    /// Payment source to charge instead of the customer's default.
    pub source: Option<String>,
}

impl InvoicePayParams {
    pub fn with_source(source: impl Into<String>) -> Self {
        InvoicePayParams {
            source: Some(source.into()),
        }
    }
}

/// Parameters for previewing a customer's next invoice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UpcomingInvoiceParams {
    pub customer: String,
    pub subscription: Option<String>,
    pub subscription_plan: Option<String>,
    pub subscription_quantity: Option<u64>,
    pub subscription_proration_date: Option<i64>,
    pub subscription_trial_end: Option<i64>,
    /// Preview without prorating subscription changes.
    pub skip_proration: bool,
}

impl UpcomingInvoiceParams {
    pub fn for_customer(customer: impl Into<String>) -> Self {
        UpcomingInvoiceParams {
            customer: customer.into(),
            ..Default::default()
        }
    }

    pub fn with_subscription(mut self, subscription: impl Into<String>) -> Self {
        self.subscription = Some(subscription.into());
        self
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push("customer", &self.customer)
            .push_opt("subscription", self.subscription.as_deref())
            .push_opt("subscription_plan", self.subscription_plan.as_deref())
            .push_opt("subscription_quantity", self.subscription_quantity)
            .push_opt("subscription_proration_date", self.subscription_proration_date)
            .push_opt("subscription_trial_end", self.subscription_trial_end);
        if self.skip_proration {
            params.push("subscription_prorate", false);
        }
        params
    }
}

/// Filters for listing invoices.
///
/// ```
/// use invoice_kit::invoice::{Billing, InvoiceListParams};
/// use invoice_kit::params::FilterOp;
///
/// let params = InvoiceListParams::for_customer("cus_1")
///     .with_billing(Billing::SendInvoice)
///     .due_date(FilterOp::Gt, 1_500_000_000)
///     .due_date(FilterOp::Lt, 1_600_000_000);
/// assert_eq!(params.list.filters.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvoiceListParams {
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub billing: Option<Billing>,
    pub list: ListParams,
}

impl InvoiceListParams {
    pub fn for_customer(customer: impl Into<String>) -> Self {
        InvoiceListParams {
            customer: Some(customer.into()),
            ..Default::default()
        }
    }

    pub fn with_billing(mut self, billing: Billing) -> Self {
        self.billing = Some(billing);
        self
    }

    /// Add a `due_date` comparison. Repeat for a closed range.
    pub fn due_date(mut self, op: FilterOp, timestamp: i64) -> Self {
        self.list.filters.add("due_date", op, timestamp);
        self
    }

    /// Add a `date` comparison.
    pub fn date(mut self, op: FilterOp, timestamp: i64) -> Self {
        self.list.filters.add("date", op, timestamp);
        self
    }

    fn to_params(&self, default_limit: Option<u32>) -> Params {
        let mut params = Params::new();
        params
            .push_opt("customer", self.customer.as_deref())
            .push_opt("subscription", self.subscription.as_deref())
            .push_opt("billing", self.billing);
        self.list.append_to(&mut params, default_limit);
        params
    }
}

/// Parameters for listing the lines of one invoice.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvoiceLineListParams {
    pub customer: Option<String>,
    pub subscription: Option<String>,
    pub list: ListParams,
}

impl InvoiceLineListParams {
    fn to_params(&self, default_limit: Option<u32>) -> Params {
        let mut params = Params::new();
        params
            .push_opt("customer", self.customer.as_deref())
            .push_opt("subscription", self.subscription.as_deref());
        self.list.append_to(&mut params, default_limit);
        params
    }
}

// ============================================================================
// Client
// ============================================================================

/// Invoice operations.
#[derive(Clone)]
pub struct InvoiceClient<T: Transport> {
    client: Client<T>,
}

impl<T: Transport> InvoiceClient<T> {
    pub fn new(client: Client<T>) -> Self {
        InvoiceClient { client }
    }

    /// Create an invoice from the customer's pending items.
    ///
    /// # Errors
    /// - `Error::Validation`: customer missing, or the service rejected the
    ///   request (e.g. no pending items, `due_date` with automatic charging)
    pub async fn create(&self, params: &InvoiceParams) -> Result<Invoice> {
        if params.customer.is_empty() {
            return Err(Error::missing("customer"));
        }
        let path = self.client.paths().collection(RESOURCE);
        let invoice: Invoice = self
            .client
            .call(Method::Post, &path, params.to_params())
            .await?;
        debug!(
            "✓ Created invoice {} for {} ({} lines, amount {})",
            invoice.id,
            invoice.customer,
            invoice.lines.len(),
            invoice.amount
        );
        Ok(invoice)
    }

    pub async fn get(&self, id: &str) -> Result<Invoice> {
        let path = self.client.paths().member(RESOURCE, id)?;
        self.client.call(Method::Get, &path, Params::new()).await
    }

    /// Update the supplied fields and return the full invoice.
    pub async fn update(&self, id: &str, update: &InvoiceUpdate) -> Result<Invoice> {
        let path = self.client.paths().member(RESOURCE, id)?;
        let invoice: Invoice = self
            .client
            .call(Method::Post, &path, update.to_params())
            .await?;
        if update.close != CloseIntent::NoChange {
            debug!("✓ Invoice {} {} (closed: {})", id, update.close, invoice.closed);
        }
        Ok(invoice)
    }

    /// Attempt payment of an invoice.
    ///
    /// Sent exactly once. A timeout leaves the outcome unknown; `get` the
    /// invoice before deciding to pay again.
    ///
    /// # Errors
    /// - `Error::Payment`: the charge was declined
    /// - `Error::Validation`: the invoice is already paid, or otherwise not payable
    /// - `Error::Timeout`: no answer in time, payment may or may not have happened
    pub async fn pay(&self, id: &str, params: &InvoicePayParams) -> Result<Invoice> {
        let path = self.client.paths().action(RESOURCE, id, "pay")?;
        let mut body = Params::new();
        body.push_opt("source", params.source.as_deref());

        info!("Paying invoice {}", id);
        match self.client.call::<Invoice>(Method::Post, &path, body).await {
            Ok(invoice) => {
                info!("✓ Invoice {} paid: {} (amount {})", id, invoice.paid, invoice.amount);
                Ok(invoice)
            }
            Err(e) if e.is_transport() => {
                warn!("Outcome of payment for invoice {} unknown: {}", id, e);
                Err(e)
            }
            Err(e) => {
                info!("✗ Payment of invoice {} failed: {}", id, e);
                Err(e)
            }
        }
    }

    /// Compute, without persisting, the next invoice for a customer.
    ///
    /// # Errors
    /// - `Error::Validation`: customer missing
    /// - `Error::NotFound`: nothing to invoice for this customer
    pub async fn preview_next(&self, params: &UpcomingInvoiceParams) -> Result<Invoice> {
        if params.customer.is_empty() {
            return Err(Error::missing("customer"));
        }
        let path = self.client.paths().nested(RESOURCE, "upcoming");
        self.client.call(Method::Get, &path, params.to_params()).await
    }

    /// Iterate over invoices matching `params`, newest first as the service orders them.
    pub fn list(&self, params: &InvoiceListParams) -> ListIter<Invoice, T> {
        ListIter::new(
            self.client.clone(),
            self.client.paths().collection(RESOURCE),
            params.to_params(self.client.config().page_limit),
            params.list.cursor.clone(),
        )
    }

    /// Iterate over the lines of one invoice.
    ///
    /// An invalid id yields an iterator that reports the error from `err()`.
    pub fn list_lines(
        &self,
        invoice_id: &str,
        params: &InvoiceLineListParams,
    ) -> ListIter<InvoiceLine, T> {
        match self.client.paths().action(RESOURCE, invoice_id, "lines") {
            Ok(path) => ListIter::new(
                self.client.clone(),
                path,
                params.to_params(self.client.config().page_limit),
                params.list.cursor.clone(),
            ),
            Err(e) => ListIter::failed(self.client.clone(), invoice_id.to_string(), e),
        }
    }

    /// Iterate over all lines of an invoice already in hand.
    ///
    /// The embedded first page is served without a request; later pages are
    /// fetched from the lines endpoint. A preview has no id, so only its
    /// embedded page is served.
    pub fn lines_of(&self, invoice: &Invoice) -> ListIter<InvoiceLine, T> {
        if invoice.id.is_empty() {
            let page = invoice.lines.clone();
            return ListIter::single_page(self.client.clone(), page.meta.url.clone(), page);
        }
        match self.client.paths().action(RESOURCE, &invoice.id, "lines") {
            Ok(path) => {
                let mut base = Params::new();
                base.push_opt("limit", self.client.config().page_limit);
                ListIter::from_page(self.client.clone(), path, base, invoice.lines.clone())
            }
            Err(e) => ListIter::failed(self.client.clone(), invoice.id.clone(), e),
        }
    }
}
