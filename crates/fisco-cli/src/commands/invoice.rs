use clap::Args;
use serde_json::Value;

use fisco_core::invoice::Invoice;
use fisco_core::sync::{sync_fiscal_lines, SyncContext};

use crate::commands::load_chart;
use crate::input;

/// Arguments for invoice synchronization
#[derive(Args)]
pub struct InvoiceArgs {
    /// Path to JSON (or YAML) customer invoice
    #[arg(long)]
    pub input: Option<String>,

    /// Chart of accounts file; defaults to the Italian starter chart
    #[arg(long)]
    pub chart: Option<String>,
}

pub fn run_invoice(args: InvoiceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut invoice: Invoice = input::read_document(&args.input, "customer invoice")?;
    invoice.normalize();
    let chart = load_chart(&args.chart)?;

    let outcome = sync_fiscal_lines(&mut invoice, &chart, &SyncContext::new());
    let amounts = invoice.fiscal_amounts();

    Ok(serde_json::json!({
        "result": amounts,
        "lines": invoice.lines(),
        "warnings": outcome.warnings.clone(),
        "sync": outcome,
    }))
}
