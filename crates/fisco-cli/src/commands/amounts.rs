use clap::Args;
use serde_json::Value;

use fisco_core::amounts::{calculate_fiscal_amounts, FiscalAmountsInput};

use crate::input;

/// Arguments for the raw amount calculation
#[derive(Args)]
pub struct AmountsArgs {
    /// Path to JSON (or YAML) input file with lines and settings
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_amounts(args: AmountsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let amounts_input: FiscalAmountsInput =
        input::read_document(&args.input, "fiscal amounts")?;
    let result = calculate_fiscal_amounts(&amounts_input)?;
    Ok(serde_json::to_value(result)?)
}
