use napi::Result as NapiResult;
use napi_derive::napi;

use fisco_core::lookup::InMemoryChart;
use fisco_core::sync::{sync_fiscal_lines, SyncContext};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_chart(chart_json: Option<String>) -> NapiResult<InMemoryChart> {
    match chart_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error),
        None => Ok(InMemoryChart::italian_defaults()),
    }
}

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_amounts(input_json: String) -> NapiResult<String> {
    let input: fisco_core::amounts::FiscalAmountsInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        fisco_core::amounts::calculate_fiscal_amounts(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Document synchronization
// ---------------------------------------------------------------------------

#[napi]
pub fn sync_sale_order(order_json: String, chart_json: Option<String>) -> NapiResult<String> {
    let mut order: fisco_core::sale_order::SaleOrder =
        serde_json::from_str(&order_json).map_err(to_napi_error)?;
    order.normalize();
    let chart = parse_chart(chart_json)?;
    let outcome = sync_fiscal_lines(&mut order, &chart, &SyncContext::new());
    let totals = order.totals();
    serde_json::to_string(&serde_json::json!({
        "result": totals,
        "lines": order.lines(),
        "sync": outcome,
    }))
    .map_err(to_napi_error)
}

#[napi]
pub fn sync_invoice(invoice_json: String, chart_json: Option<String>) -> NapiResult<String> {
    let mut invoice: fisco_core::invoice::Invoice =
        serde_json::from_str(&invoice_json).map_err(to_napi_error)?;
    invoice.normalize();
    let chart = parse_chart(chart_json)?;
    let outcome = sync_fiscal_lines(&mut invoice, &chart, &SyncContext::new());
    let amounts = invoice.fiscal_amounts();
    serde_json::to_string(&serde_json::json!({
        "result": amounts,
        "lines": invoice.lines(),
        "sync": outcome,
    }))
    .map_err(to_napi_error)
}

#[napi]
pub fn sync_subscription(
    subscription_json: String,
    chart_json: Option<String>,
) -> NapiResult<String> {
    let mut subscription: fisco_core::subscription::Subscription =
        serde_json::from_str(&subscription_json).map_err(to_napi_error)?;
    subscription.normalize();
    let chart = parse_chart(chart_json)?;
    let outcome = sync_fiscal_lines(&mut subscription, &chart, &SyncContext::new());
    let totals = subscription.totals();
    serde_json::to_string(&serde_json::json!({
        "result": totals,
        "lines": subscription.lines(),
        "sync": outcome,
    }))
    .map_err(to_napi_error)
}
