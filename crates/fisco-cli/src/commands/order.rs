use clap::Args;
use serde_json::Value;

use fisco_core::sale_order::SaleOrder;
use fisco_core::sync::{sync_fiscal_lines, SyncContext};

use crate::commands::load_chart;
use crate::input;

/// Arguments for sales-order synchronization
#[derive(Args)]
pub struct OrderArgs {
    /// Path to JSON (or YAML) sales order
    #[arg(long)]
    pub input: Option<String>,

    /// Chart of accounts file; defaults to the Italian starter chart
    #[arg(long)]
    pub chart: Option<String>,
}

pub fn run_order(args: OrderArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut order: SaleOrder = input::read_document(&args.input, "sales order")?;
    order.normalize();
    let chart = load_chart(&args.chart)?;

    let outcome = sync_fiscal_lines(&mut order, &chart, &SyncContext::new());
    let totals = order.totals();

    Ok(serde_json::json!({
        "result": totals,
        "vat_label": order.vat_label(),
        "lines": order.lines(),
        "warnings": outcome.warnings.clone(),
        "sync": outcome,
    }))
}
