use clap::Args;
use serde_json::Value;

use fisco_core::subscription::Subscription;
use fisco_core::sync::{sync_fiscal_lines, SyncContext};

use crate::commands::load_chart;
use crate::input;

/// Arguments for subscription synchronization
#[derive(Args)]
pub struct SubscriptionArgs {
    /// Path to JSON (or YAML) subscription
    #[arg(long)]
    pub input: Option<String>,

    /// Chart of accounts file; defaults to the Italian starter chart
    #[arg(long)]
    pub chart: Option<String>,
}

pub fn run_subscription(args: SubscriptionArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut subscription: Subscription = input::read_document(&args.input, "subscription")?;
    subscription.normalize();
    let chart = load_chart(&args.chart)?;

    let outcome = sync_fiscal_lines(&mut subscription, &chart, &SyncContext::new());
    let totals = subscription.totals();

    let mut warnings = outcome.warnings.clone();
    if let Some(notice) = subscription.settings_change_notice() {
        warnings.push(notice);
    }

    Ok(serde_json::json!({
        "result": totals,
        "lines": subscription.lines(),
        "warnings": warnings,
        "sync": outcome,
    }))
}
