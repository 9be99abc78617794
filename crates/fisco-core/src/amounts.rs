use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::line::{DocumentLine, TaxRate};
use crate::settings::FiscalSettings;
use crate::types::{round_currency, with_metadata, ComputationOutput, Currency, Money};
use crate::FiscoResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Derived fiscal totals of a document. Never persisted truth: always a
/// function of the current lines and settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputedAmounts {
    pub untaxed_base: Money,
    pub cassa_amount: Money,
    pub tax_amount: Money,
    pub gross_total: Money,
    pub withholding_amount: Money,
    pub net_amount: Money,
}

impl ComputedAmounts {
    pub fn zero() -> Self {
        Self {
            untaxed_base: Decimal::ZERO,
            cassa_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            gross_total: Decimal::ZERO,
            withholding_amount: Decimal::ZERO,
            net_amount: Decimal::ZERO,
        }
    }
}

/// Input for the envelope entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiscalAmountsInput {
    #[serde(default)]
    pub lines: Vec<DocumentLine>,
    pub settings: FiscalSettings,
    #[serde(default)]
    pub currency: Currency,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

/// Compute the fiscal totals of a document from its normal lines.
///
/// Pure and order-independent over lines; synthetic lines in the input are
/// ignored. The ordering is the canonical one: the cassa surcharge enters the
/// tax base per line (percent-type rates are applied to cassa-inflated
/// subtotals) and the withholding base is untaxed base plus cassa. Rounding
/// is half-up at the currency precision, applied to the cassa, the summed
/// tax, the withholding and the net; intermediates are not re-rounded.
pub fn compute_amounts(
    lines: &[DocumentLine],
    settings: &FiscalSettings,
    currency: &Currency,
) -> ComputedAmounts {
    let normal: Vec<&DocumentLine> = lines.iter().filter(|l| !l.is_fiscal()).collect();

    let untaxed_base: Money = normal.iter().map(|l| l.subtotal).sum();

    let cassa_amount = if settings.apply_cassa {
        round_currency(untaxed_base * settings.cassa_percent / dec!(100), currency)
    } else {
        Decimal::ZERO
    };

    let taxable_base = untaxed_base + cassa_amount;

    let mut tax_amount = Decimal::ZERO;
    for line in &normal {
        let mut inflated = line.subtotal;
        if settings.apply_cassa {
            inflated += line.subtotal * settings.cassa_percent / dec!(100);
        }
        for rate in &line.taxes {
            match rate {
                TaxRate::Percent(_) => tax_amount += rate.amount_on(inflated),
                TaxRate::Fixed(amount) => tax_amount += *amount,
            }
        }
    }
    let tax_amount = round_currency(tax_amount, currency);

    let gross_total = taxable_base + tax_amount;

    let withholding_amount = if settings.apply_withholding {
        round_currency(
            taxable_base * settings.withholding_percent / dec!(100),
            currency,
        )
    } else {
        Decimal::ZERO
    };

    let net_amount = round_currency(gross_total - withholding_amount, currency);

    ComputedAmounts {
        untaxed_base,
        cassa_amount,
        tax_amount,
        gross_total,
        withholding_amount,
        net_amount,
    }
}

/// Envelope entry point: validates the settings, computes the totals and
/// wraps them with methodology and assumptions.
pub fn calculate_fiscal_amounts(
    input: &FiscalAmountsInput,
) -> FiscoResult<ComputationOutput<ComputedAmounts>> {
    let start = Instant::now();

    let mut warnings = input.settings.validate()?;
    if input.lines.iter().all(|l| l.is_fiscal()) && !input.lines.is_empty() {
        warnings.push("Document contains only synthetic fiscal lines".to_string());
    }

    let result = compute_amounts(&input.lines, &input.settings, &input.currency);

    let assumptions = serde_json::json!({
        "line_count": input.lines.len(),
        "apply_cassa": input.settings.apply_cassa,
        "cassa_percent": input.settings.cassa_percent.to_string(),
        "apply_withholding": input.settings.apply_withholding,
        "withholding_percent": input.settings.withholding_percent.to_string(),
        "currency": &input.currency,
    });

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Cassa previdenziale taxed per line on inflated subtotals; withholding on untaxed base plus cassa",
        &assumptions,
        warnings,
        elapsed,
        result,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
