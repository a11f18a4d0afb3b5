//! Invoice items: pending charges and credits attached to a customer.
//!
//! An item stays pending until an invoice is created for its customer; the
//! service then sweeps every pending item into that invoice's lines and sets
//! the item's `invoice` reference.

use crate::client::Client;
use crate::error::{Error, Result};
use crate::list::ListIter;
use crate::params::{FilterOp, ListParams, Params};
use crate::resource::{expandable_id, optional_expandable_id, ApiResource, Deleted, Period};
use crate::transport::{Method, Transport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const RESOURCE: &str = "invoiceitems";

/// A pending (or already invoiced) charge or credit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub id: String,
    #[serde(deserialize_with = "expandable_id")]
    pub customer: String,
    /// Minor currency units. Negative for credits.
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub discountable: bool,
    pub date: i64,
    /// Set once the item has been swept into an invoice.
    #[serde(default, deserialize_with = "optional_expandable_id")]
    pub invoice: Option<String>,
    #[serde(default, deserialize_with = "optional_expandable_id")]
    pub subscription: Option<String>,
    #[serde(default)]
    pub proration: bool,
    #[serde(default)]
    pub quantity: Option<u64>,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub livemode: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl InvoiceItem {
    /// Not yet bound to an invoice.
    pub fn is_pending(&self) -> bool {
        self.invoice.is_none()
    }
}

impl ApiResource for InvoiceItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn object_name() -> &'static str {
        "invoiceitem"
    }
}

/// Parameters for creating an invoice item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceItemParams {
    pub customer: String,
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    pub discountable: Option<bool>,
    /// Attach to this draft invoice instead of the customer's next one.
    pub invoice: Option<String>,
    pub subscription: Option<String>,
    pub metadata: BTreeMap<String, String>,
}

impl InvoiceItemParams {
    pub fn new(customer: impl Into<String>, amount: i64, currency: impl Into<String>) -> Self {
        InvoiceItemParams {
            customer: customer.into(),
            amount,
            currency: currency.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_discountable(mut self, discountable: bool) -> Self {
        self.discountable = Some(discountable);
        self
    }

    /// Only presence of required fields is checked; amounts are the service's call.
    fn validate(&self) -> Result<()> {
        if self.customer.is_empty() {
            return Err(Error::missing("customer"));
        }
        if self.currency.is_empty() {
            return Err(Error::missing("currency"));
        }
        Ok(())
    }

    fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push("customer", &self.customer)
            .push("amount", self.amount)
            .push("currency", &self.currency)
            .push_opt("description", self.description.as_deref())
            .push_opt("discountable", self.discountable)
            .push_opt("invoice", self.invoice.as_deref())
            .push_opt("subscription", self.subscription.as_deref())
            .push_metadata(&self.metadata);
        params
    }
}

/// Partial update of an invoice item. `None` fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InvoiceItemUpdate {
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub discountable: Option<bool>,
    pub metadata: BTreeMap<String, String>,
}

impl InvoiceItemUpdate {
    fn to_params(&self) -> Params {
        let mut params = Params::new();
        params
            .push_opt("amount", self.amount)
            .push_opt("description", self.description.as_deref())
            .push_opt("discountable", self.discountable)
            .push_metadata(&self.metadata);
        params
    }
}

/// Filters for listing invoice items.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvoiceItemListParams {
    pub customer: Option<String>,
    pub invoice: Option<String>,
    pub list: ListParams,
}

impl InvoiceItemListParams {
    pub fn for_customer(customer: impl Into<String>) -> Self {
        InvoiceItemListParams {
            customer: Some(customer.into()),
            ..Default::default()
        }
    }

    /// Add a `created` comparison.
    pub fn created(mut self, op: FilterOp, timestamp: i64) -> Self {
        self.list.filters.add("created", op, timestamp);
        self
    }

    fn to_params(&self, default_limit: Option<u32>) -> Params {
        let mut params = Params::new();
        params
            .push_opt("customer", self.customer.as_deref())
            .push_opt("invoice", self.invoice.as_deref());
        self.list.append_to(&mut params, default_limit);
        params
    }
}

/// Invoice item operations.
#[derive(Clone)]
pub struct InvoiceItemClient<T: Transport> {
    client: Client<T>,
}

impl<T: Transport> InvoiceItemClient<T> {
    pub fn new(client: Client<T>) -> Self {
        InvoiceItemClient { client }
    }

    /// Create a pending item for a customer.
    ///
    /// # Errors
    /// - `Error::Validation`: customer or currency missing, or rejected by the service
    pub async fn create(&self, params: &InvoiceItemParams) -> Result<InvoiceItem> {
        params.validate()?;
        let path = self.client.paths().collection(RESOURCE);
        let item: InvoiceItem = self
            .client
            .call(Method::Post, &path, params.to_params())
            .await?;
        debug!("✓ Created invoice item {} for {}", item.id, item.customer);
        Ok(item)
    }

    /// # Errors
    /// - `Error::NotFound`: unknown id
    pub async fn get(&self, id: &str) -> Result<InvoiceItem> {
        let path = self.client.paths().member(RESOURCE, id)?;
        self.client.call(Method::Get, &path, Params::new()).await
    }

    /// Update the supplied fields and return the full item.
    pub async fn update(&self, id: &str, update: &InvoiceItemUpdate) -> Result<InvoiceItem> {
        let path = self.client.paths().member(RESOURCE, id)?;
        self.client
            .call(Method::Post, &path, update.to_params())
            .await
    }

    /// Delete an item.
    ///
    /// Deleting an already deleted item is answered by the service with the
    /// same `deleted: true` marker; that answer is passed through as is.
    pub async fn delete(&self, id: &str) -> Result<Deleted> {
        let path = self.client.paths().member(RESOURCE, id)?;
        let deleted: Deleted = self
            .client
            .call(Method::Delete, &path, Params::new())
            .await?;
        debug!("✓ Deleted invoice item {} ({})", deleted.id, deleted.deleted);
        Ok(deleted)
    }

    /// Iterate over invoice items matching `params`.
    pub fn list(&self, params: &InvoiceItemListParams) -> ListIter<InvoiceItem, T> {
        ListIter::new(
            self.client.clone(),
            self.client.paths().collection(RESOURCE),
            params.to_params(self.client.config().page_limit),
            params.list.cursor.clone(),
        )
    }
}
