//! Fake billing service for integration tests.
//!
//! Implements [`Transport`] over an in-process state machine that behaves like
//! the real service for the endpoints this crate uses: pending items are swept
//! into new invoices, tax is computed from `tax_percent`, lists are newest
//! first with `starting_after` / `ending_before` cursors, and comparison
//! filters are applied.

#![allow(dead_code)]

use invoice_kit::params::Params;
use invoice_kit::path::PathBuilder;
use invoice_kit::transport::{Method, Request, Response, Transport};
use invoice_kit::{Client, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Source token the fake treats as a declined card.
pub const DECLINED_SOURCE: &str = "tok_chargeDeclined";

const DEFAULT_LIMIT: usize = 10;
const START_CLOCK: i64 = 1_500_000_000;

#[derive(Clone, Debug)]
struct ItemRecord {
    id: String,
    customer: String,
    amount: i64,
    currency: String,
    description: Option<String>,
    date: i64,
    invoice: Option<String>,
    deleted: bool,
}

impl ItemRecord {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "object": "invoiceitem",
            "customer": self.customer,
            "amount": self.amount,
            "currency": self.currency,
            "description": self.description,
            "discountable": true,
            "date": self.date,
            "invoice": self.invoice,
            "subscription": null,
            "proration": false,
            "quantity": null,
            "period": {"start": self.date, "end": self.date},
            "livemode": false,
            "metadata": {}
        })
    }

    fn to_line(&self) -> Value {
        json!({
            "id": self.id,
            "object": "line_item",
            "amount": self.amount,
            "currency": self.currency,
            "description": self.description,
            "type": "invoiceitem",
            "period": {"start": self.date, "end": self.date},
            "discountable": true,
            "proration": false,
            "quantity": null,
            "subscription": null,
            "livemode": false,
            "metadata": {}
        })
    }
}

#[derive(Clone, Debug)]
struct InvoiceRecord {
    id: String,
    customer: String,
    subscription: Option<String>,
    billing: String,
    due_date: Option<i64>,
    tax_percent: Option<f64>,
    lines: Vec<Value>,
    currency: String,
    date: i64,
    closed: bool,
    paid: bool,
    forgiven: bool,
    attempt_count: u32,
    description: Option<String>,
    statement_descriptor: Option<String>,
}

impl InvoiceRecord {
    fn to_json(&self) -> Value {
        let mut payload = invoice_json(
            &self.customer,
            self.subscription.as_deref(),
            &self.currency,
            self.tax_percent,
            &self.lines,
            &format!("/v1/invoices/{}/lines", self.id),
        );
        let fields = json!({
            "id": self.id,
            "billing": self.billing,
            "due_date": self.due_date,
            "date": self.date,
            "period_start": self.date,
            "period_end": self.date,
            "closed": self.closed,
            "paid": self.paid,
            "forgiven": self.forgiven,
            "attempted": self.attempt_count > 0,
            "attempt_count": self.attempt_count,
            "description": self.description,
            "statement_descriptor": self.statement_descriptor,
        });
        if let (Some(target), Some(source)) = (payload.as_object_mut(), fields.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        payload
    }
}

/// Totals and embedded lines shared by stored invoices and previews.
fn invoice_json(
    customer: &str,
    subscription: Option<&str>,
    currency: &str,
    tax_percent: Option<f64>,
    lines: &[Value],
    lines_url: &str,
) -> Value {
    let subtotal: i64 = lines.iter().filter_map(|l| l["amount"].as_i64()).sum();
    let tax = tax_percent.map(|pct| (subtotal as f64 * pct / 100.0).round() as i64);
    let amount = subtotal + tax.unwrap_or(0);
    json!({
        "object": "invoice",
        "customer": customer,
        "subscription": subscription,
        "amount_due": amount,
        "subtotal": subtotal,
        "tax": tax,
        "tax_percent": tax_percent,
        "total": amount,
        "currency": currency,
        "lines": {
            "object": "list",
            "data": lines,
            "has_more": false,
            "total_count": lines.len(),
            "url": lines_url
        },
        "livemode": false,
        "metadata": {},
        "starting_balance": 0
    })
}

#[derive(Default)]
struct State {
    clock: i64,
    items: Vec<ItemRecord>,
    invoices: Vec<InvoiceRecord>,
    subscriptions: HashMap<String, (String, i64)>,
    requests: Vec<Request>,
}

impl State {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        START_CLOCK + self.clock
    }
}

/// In-process billing service.
#[derive(Clone, Default)]
pub struct FakeBillingService {
    state: Arc<Mutex<State>>,
}

impl FakeBillingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client wired to a fresh fake service.
    pub fn client() -> (Client<FakeBillingService>, FakeBillingService) {
        let service = FakeBillingService::new();
        (Client::new(service.clone()), service)
    }

    /// Register a subscription whose next period is charged `amount`.
    pub async fn add_subscription(&self, customer: &str, subscription: &str, amount: i64) {
        self.state
            .lock()
            .await
            .subscriptions
            .insert(customer.to_string(), (subscription.to_string(), amount));
    }

    /// Number of requests sent to `method path` so far.
    pub async fn count(&self, method: Method, path: &str) -> usize {
        self.state
            .lock()
            .await
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub async fn requests(&self) -> Vec<Request> {
        self.state.lock().await.requests.clone()
    }
}

impl Transport for FakeBillingService {
    async fn execute(&self, request: Request) -> Result<Response> {
        let mut state = self.state.lock().await;
        state.requests.push(request.clone());

        let segments = PathBuilder::parse(&request.path);
        let params = &request.params;

        let response = match (request.method, segments.as_slice()) {
            (Method::Post, ["v1", "invoiceitems"]) => create_item(&mut state, params),
            (Method::Get, ["v1", "invoiceitems"]) => list_items(&state, params),
            (Method::Get, ["v1", "invoiceitems", id]) => get_item(&state, id),
            (Method::Post, ["v1", "invoiceitems", id]) => update_item(&mut state, id, params),
            (Method::Delete, ["v1", "invoiceitems", id]) => delete_item(&mut state, id),
            (Method::Post, ["v1", "invoices"]) => create_invoice(&mut state, params),
            (Method::Get, ["v1", "invoices"]) => list_invoices(&state, params),
            (Method::Get, ["v1", "invoices", "upcoming"]) => upcoming(&state, params),
            (Method::Get, ["v1", "invoices", id]) => get_invoice(&state, id),
            (Method::Post, ["v1", "invoices", id]) => update_invoice(&mut state, id, params),
            (Method::Post, ["v1", "invoices", id, "pay"]) => pay_invoice(&mut state, id, params),
            (Method::Get, ["v1", "invoices", id, "lines"]) => list_lines(&state, id, params),
            _ => error(404, "invalid_request_error", "Unrecognized request URL", None),
        };
        Ok(response)
    }
}

// ============================================================================
// Handlers
// ============================================================================

fn create_item(state: &mut State, params: &Params) -> Response {
    let amount = match params.get("amount").and_then(|a| a.parse::<i64>().ok()) {
        Some(amount) if amount != 0 => amount,
        _ => {
            return error(400, "invalid_request_error", "Invalid integer: amount", Some("amount"))
        }
    };
    let date = state.tick();
    let item = ItemRecord {
        id: new_id("ii"),
        customer: params.get("customer").unwrap_or_default().to_string(),
        amount,
        currency: params.get("currency").unwrap_or_default().to_string(),
        description: params.get("description").map(str::to_string),
        date,
        invoice: None,
        deleted: false,
    };
    let payload = item.to_json();
    state.items.push(item);
    Response::ok(payload)
}

fn get_item(state: &State, id: &str) -> Response {
    match state.items.iter().find(|i| i.id == id && !i.deleted) {
        Some(item) => Response::ok(item.to_json()),
        None => missing("invoiceitem", id),
    }
}

fn update_item(state: &mut State, id: &str, params: &Params) -> Response {
    let Some(item) = state.items.iter_mut().find(|i| i.id == id && !i.deleted) else {
        return missing("invoiceitem", id);
    };
    if let Some(amount) = params.get("amount").and_then(|a| a.parse().ok()) {
        item.amount = amount;
    }
    if let Some(description) = params.get("description") {
        item.description = Some(description.to_string());
    }
    Response::ok(item.to_json())
}

fn delete_item(state: &mut State, id: &str) -> Response {
    match state.items.iter_mut().find(|i| i.id == id) {
        Some(item) => {
            item.deleted = true;
            Response::ok(json!({"id": id, "deleted": true}))
        }
        None => missing("invoiceitem", id),
    }
}

fn list_items(state: &State, params: &Params) -> Response {
    let values: Vec<Value> = state
        .items
        .iter()
        .rev()
        .filter(|i| !i.deleted)
        .filter(|i| params.get("customer").map_or(true, |c| c == i.customer))
        .filter(|i| params.get("invoice").map_or(true, |inv| Some(inv) == i.invoice.as_deref()))
        .filter(|i| matches_range(params, "created", Some(i.date)))
        .map(ItemRecord::to_json)
        .collect();
    paginate(values, params, "/v1/invoiceitems")
}

fn create_invoice(state: &mut State, params: &Params) -> Response {
    let customer = params.get("customer").unwrap_or_default().to_string();
    let billing = params.get("billing").unwrap_or("charge_automatically").to_string();
    let due_date = params.get("due_date").and_then(|d| d.parse::<i64>().ok());

    if due_date.is_some() && billing != "send_invoice" {
        return error(
            400,
            "invalid_request_error",
            "Invoices with billing=charge_automatically cannot have a due date",
            Some("due_date"),
        );
    }
    if billing == "send_invoice" && due_date.is_none() && params.get("days_until_due").is_none() {
        return error(
            400,
            "invalid_request_error",
            "Invoices with billing=send_invoice need a due date",
            Some("due_date"),
        );
    }

    let pending: Vec<usize> = state
        .items
        .iter()
        .enumerate()
        .filter(|(_, i)| i.customer == customer && i.invoice.is_none() && !i.deleted)
        .map(|(idx, _)| idx)
        .collect();
    if pending.is_empty() {
        return error(
            400,
            "invalid_request_error",
            &format!("Nothing to invoice for customer {}", customer),
            None,
        );
    }

    let id = new_id("in");
    let mut lines = Vec::with_capacity(pending.len());
    let mut currency = String::new();
    for idx in pending {
        let item = &mut state.items[idx];
        item.invoice = Some(id.clone());
        currency = item.currency.clone();
        lines.push(item.to_line());
    }

    let date = state.tick();
    let record = InvoiceRecord {
        id,
        customer,
        subscription: params.get("subscription").map(str::to_string),
        billing,
        due_date,
        tax_percent: params.get("tax_percent").and_then(|p| p.parse().ok()),
        lines,
        currency,
        date,
        closed: false,
        paid: false,
        forgiven: false,
        attempt_count: 0,
        description: params.get("description").map(str::to_string),
        statement_descriptor: params.get("statement_descriptor").map(str::to_string),
    };
    let payload = record.to_json();
    state.invoices.push(record);
    Response::ok(payload)
}

fn get_invoice(state: &State, id: &str) -> Response {
    match state.invoices.iter().find(|i| i.id == id) {
        Some(invoice) => Response::ok(invoice.to_json()),
        None => missing("invoice", id),
    }
}

fn update_invoice(state: &mut State, id: &str, params: &Params) -> Response {
    let Some(invoice) = state.invoices.iter_mut().find(|i| i.id == id) else {
        return missing("invoice", id);
    };
    if let Some(closed) = params.get("closed") {
        invoice.closed = closed == "true";
    }
    if let Some(forgiven) = params.get("forgiven") {
        invoice.forgiven = forgiven == "true";
    }
    if let Some(description) = params.get("description") {
        invoice.description = Some(description.to_string());
    }
    if let Some(descriptor) = params.get("statement_descriptor") {
        invoice.statement_descriptor = Some(descriptor.to_string());
    }
    if let Some(pct) = params.get("tax_percent").and_then(|p| p.parse().ok()) {
        invoice.tax_percent = Some(pct);
    }
    if let Some(due_date) = params.get("due_date").and_then(|d| d.parse().ok()) {
        invoice.due_date = Some(due_date);
    }
    Response::ok(invoice.to_json())
}

fn pay_invoice(state: &mut State, id: &str, params: &Params) -> Response {
    let Some(invoice) = state.invoices.iter_mut().find(|i| i.id == id) else {
        return missing("invoice", id);
    };
    if invoice.paid {
        return error(400, "invalid_request_error", "Invoice is already paid", None);
    }

    invoice.attempt_count += 1;
    if params.get("source") == Some(DECLINED_SOURCE) {
        return Response {
            status: 402,
            payload: json!({"error": {
                "type": "card_error",
                "code": "card_declined",
                "decline_code": "generic_decline",
                "message": "Your card was declined."
            }}),
        };
    }

    invoice.paid = true;
    Response::ok(invoice.to_json())
}

fn list_invoices(state: &State, params: &Params) -> Response {
    let values: Vec<Value> = state
        .invoices
        .iter()
        .rev()
        .filter(|i| params.get("customer").map_or(true, |c| c == i.customer))
        .filter(|i| {
            params
                .get("subscription")
                .map_or(true, |s| Some(s) == i.subscription.as_deref())
        })
        .filter(|i| params.get("billing").map_or(true, |b| b == i.billing))
        .filter(|i| matches_range(params, "due_date", i.due_date))
        .filter(|i| matches_range(params, "date", Some(i.date)))
        .map(InvoiceRecord::to_json)
        .collect();
    paginate(values, params, "/v1/invoices")
}

fn list_lines(state: &State, id: &str, params: &Params) -> Response {
    match state.invoices.iter().find(|i| i.id == id) {
        Some(invoice) => paginate(invoice.lines.clone(), params, &format!("/v1/invoices/{}/lines", id)),
        None => missing("invoice", id),
    }
}

fn upcoming(state: &State, params: &Params) -> Response {
    let customer = params.get("customer").unwrap_or_default();
    let mut lines: Vec<Value> = state
        .items
        .iter()
        .filter(|i| i.customer == customer && i.invoice.is_none() && !i.deleted)
        .map(ItemRecord::to_line)
        .collect();

    let subscription = state.subscriptions.get(customer).filter(|(sub, _)| {
        params.get("subscription").map_or(true, |requested| sub.as_str() == requested)
    });
    if let Some((sub, amount)) = subscription {
        lines.push(json!({
            "id": format!("sli_{}", sub),
            "object": "line_item",
            "amount": amount,
            "currency": "usd",
            "description": null,
            "type": "subscription",
            "period": {"start": START_CLOCK, "end": START_CLOCK + 2_592_000},
            "discountable": true,
            "proration": params.get("subscription_prorate") != Some("false"),
            "quantity": 1,
            "subscription": sub,
            "livemode": false,
            "metadata": {}
        }));
    }

    if lines.is_empty() {
        return error(
            404,
            "invalid_request_error",
            &format!("No upcoming invoices for customer: {}", customer),
            None,
        );
    }

    let currency = lines[0]["currency"].as_str().unwrap_or("usd").to_string();
    Response::ok(invoice_json(
        customer,
        subscription.map(|(sub, _)| sub.as_str()),
        &currency,
        None,
        &lines,
        "/v1/invoices/upcoming/lines",
    ))
}

// ============================================================================
// Helpers
// ============================================================================

fn new_id(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::now_v7().simple())
}

fn error(status: u16, kind: &str, message: &str, param: Option<&str>) -> Response {
    Response {
        status,
        payload: json!({"error": {"type": kind, "message": message, "param": param}}),
    }
}

fn missing(object: &str, id: &str) -> Response {
    Response {
        status: 404,
        payload: json!({"error": {
            "type": "invalid_request_error",
            "code": "resource_missing",
            "message": format!("No such {}: {}", object, id),
            "param": "id"
        }}),
    }
}

/// Apply every `field`, `field[gt]`, `field[gte]`, `field[lt]`, `field[lte]`
/// constraint. A missing value fails any constraint.
fn matches_range(params: &Params, field: &str, value: Option<i64>) -> bool {
    params.pairs().iter().all(|(key, raw)| {
        let op = if key == field {
            "eq"
        } else if let Some(op) = key
            .strip_prefix(field)
            .and_then(|rest| rest.strip_prefix('['))
            .and_then(|rest| rest.strip_suffix(']'))
        {
            op
        } else {
            return true;
        };

        let (Some(value), Ok(bound)) = (value, raw.parse::<i64>()) else {
            return false;
        };
        match op {
            "eq" => value == bound,
            "gt" => value > bound,
            "gte" => value >= bound,
            "lt" => value < bound,
            "lte" => value <= bound,
            _ => false,
        }
    })
}

/// Slice `values` (already in list order) by cursor and limit.
fn paginate(values: Vec<Value>, params: &Params, url: &str) -> Response {
    let limit = params
        .get("limit")
        .and_then(|l| l.parse::<usize>().ok())
        .unwrap_or(DEFAULT_LIMIT);
    let total = values.len();
    let position = |id: &str| values.iter().position(|v| v["id"] == id);

    let (start, end) = if let Some(after) = params.get("starting_after") {
        let start = position(after).map_or(total, |p| p + 1);
        (start, (start + limit).min(total))
    } else if let Some(before) = params.get("ending_before") {
        let end = position(before).unwrap_or(0);
        (end.saturating_sub(limit), end)
    } else {
        (0, limit.min(total))
    };

    let has_more = if params.get("ending_before").is_some() {
        start > 0
    } else {
        end < total
    };

    let mut envelope = json!({
        "object": "list",
        "data": values[start..end].to_vec(),
        "has_more": has_more,
        "url": url
    });
    if params.get_all("include[]").any(|v| v == "total_count") {
        envelope["total_count"] = json!(total);
    }
    Response::ok(envelope)
}
