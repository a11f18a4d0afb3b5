//! Basic usage of the invoice client over a scripted transport.

use invoice_kit::config::ClientConfig;
use invoice_kit::error::Result;
use invoice_kit::invoice::{Billing, InvoiceListParams, InvoiceParams, InvoicePayParams};
use invoice_kit::invoice_item::InvoiceItemParams;
use invoice_kit::observability::LogMetrics;
use invoice_kit::transport::{InMemoryTransport, Method};
use invoice_kit::{Client, Error, FilterOp};
use serde_json::{json, Value};
use std::time::Duration;

const CUSTOMER: &str = "cus_demo";

fn invoice(id: &str, paid: bool) -> Value {
    json!({
        "id": id,
        "object": "invoice",
        "customer": CUSTOMER,
        "amount_due": 120,
        "subtotal": 100,
        "tax": 20,
        "tax_percent": 20.0,
        "total": 120,
        "currency": "usd",
        "billing": "send_invoice",
        "due_date": 1_900_000_000,
        "paid": paid,
        "date": 1_500_000_000,
        "lines": {
            "object": "list",
            "data": [{
                "id": "ii_demo",
                "amount": 100,
                "currency": "usd",
                "description": "Setup fee",
                "type": "invoiceitem",
                "period": {"start": 1_500_000_000, "end": 1_500_000_000}
            }],
            "has_more": false,
            "total_count": 1,
            "url": format!("/v1/invoices/{}/lines", id)
        }
    })
}

/// Script the answers a real service would give for this walkthrough.
fn scripted_transport() -> InMemoryTransport {
    let transport = InMemoryTransport::new();
    transport.enqueue_json(
        Method::Post,
        "/v1/invoiceitems",
        200,
        json!({
            "id": "ii_demo", "customer": CUSTOMER, "amount": 100, "currency": "usd",
            "description": "Setup fee", "date": 1_500_000_000, "invoice": null
        }),
    );
    transport.enqueue_json(Method::Post, "/v1/invoices", 200, invoice("in_demo", false));
    transport.enqueue_json(
        Method::Get,
        "/v1/invoices",
        200,
        json!({"object": "list", "data": [invoice("in_demo", false)], "has_more": true, "url": "/v1/invoices"}),
    );
    transport.enqueue_json(
        Method::Get,
        "/v1/invoices",
        200,
        json!({"object": "list", "data": [invoice("in_older", true)], "has_more": false, "url": "/v1/invoices"}),
    );
    transport.enqueue_json(
        Method::Post,
        "/v1/invoices/in_demo/pay",
        402,
        json!({"error": {"type": "card_error", "code": "card_declined", "message": "Your card was declined."}}),
    );
    transport.enqueue_json(Method::Post, "/v1/invoices/in_demo/pay", 200, invoice("in_demo", true));
    transport
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== Invoice Kit - Basic Example ===\n");

    // 1. Build the client
    println!("1. Initializing client over the in-memory transport...");
    let config = ClientConfig::default()
        .with_timeout(Duration::from_secs(10))
        .with_page_limit(1);
    let client = Client::with_config(scripted_transport(), config)?.with_metrics(Box::new(LogMetrics));
    println!("   ✓ Client ready\n");

    // 2. Add a pending charge
    println!("2. Creating an invoice item:");
    let item = client
        .invoice_items()
        .create(&InvoiceItemParams::new(CUSTOMER, 100, "usd").with_description("Setup fee"))
        .await?;
    println!("   ✓ Item {} pending: {}\n", item.id, item.is_pending());

    // 3. Invoice it
    println!("3. Creating an invoice with 20% tax:");
    let invoice = client
        .invoices()
        .create(
            &InvoiceParams::new(CUSTOMER)
                .with_billing(Billing::SendInvoice)
                .with_due_date(1_900_000_000)
                .with_tax_percent(20.0),
        )
        .await?;
    println!(
        "   ✓ Invoice {}: subtotal {} + tax {} = {} {}\n",
        invoice.id, invoice.subtotal, invoice.tax, invoice.amount, invoice.currency
    );

    // 4. Walk emailed invoices, one page per request
    println!("4. Listing emailed invoices due after 2030-01-01 (page size 1):");
    let params = InvoiceListParams::for_customer(CUSTOMER)
        .with_billing(Billing::SendInvoice)
        .due_date(FilterOp::Gt, 1_893_456_000);
    let mut iter = client.invoices().list(&params);
    while iter.advance().await {
        if let Some(found) = iter.current() {
            println!("   - {} amount {} paid {}", found.id, found.amount, found.paid);
        }
    }
    if let Some(err) = iter.err() {
        return Err(err.clone());
    }
    println!();

    // 5. Pay, handling a decline
    println!("5. Paying the invoice:");
    let pay = client.invoices();
    match pay.pay(&invoice.id, &InvoicePayParams::with_source("tok_declined")).await {
        Err(Error::Payment { code, message, .. }) => {
            println!("   ✗ Declined ({:?}): {}", code, message);
        }
        other => {
            other?;
        }
    }
    let paid = pay.pay(&invoice.id, &InvoicePayParams::default()).await?;
    println!("   ✓ Paid with default source: {}\n", paid.paid);

    println!("=== Done ===\n");
    Ok(())
}
