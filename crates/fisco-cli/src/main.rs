mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::amounts::AmountsArgs;
use commands::invoice::InvoiceArgs;
use commands::order::OrderArgs;
use commands::subscription::SubscriptionArgs;

/// Italian withholding tax and pension-fund surcharge calculations
#[derive(Parser)]
#[command(
    name = "fisco",
    version,
    about = "Italian withholding tax and pension-fund surcharge calculations",
    long_about = "A CLI for computing Cassa Previdenziale and Ritenuta d'Acconto with \
                  decimal precision. Synchronizes the synthetic fiscal lines of sales \
                  orders, customer invoices and subscriptions and derives their totals."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute fiscal totals from raw lines and settings
    Amounts(AmountsArgs),
    /// Synchronize a sales order's fiscal lines and derive its totals
    Order(OrderArgs),
    /// Synchronize a customer invoice's fiscal lines and derive its totals
    Invoice(InvoiceArgs),
    /// Synchronize a subscription's fiscal lines and derive its totals
    Subscription(SubscriptionArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amounts(args) => commands::amounts::run_amounts(args),
        Commands::Order(args) => commands::order::run_order(args),
        Commands::Invoice(args) => commands::invoice::run_invoice(args),
        Commands::Subscription(args) => commands::subscription::run_subscription(args),
        Commands::Version => {
            println!("fisco {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
