use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::line::{tag_marker_lines, DocumentLine, FiscalLineKind, MarkerStyle, TaxRate};
use crate::lookup::{AccountRef, FiscalLookup};
use crate::settings::{CompanyDefaults, FiscalSettings};
use crate::sync::{sync_fiscal_lines, FiscalDocument, SyncContext, SyncOutcome};
use crate::types::{round_currency, Currency, Money};

/// Product used for an order's synthetic lines when nothing better resolves.
pub const AUTO_SERVICE_CODE: &str = "AUTO_SERVICE";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    #[default]
    Draft,
    Confirmed,
    Locked,
    Cancelled,
}

/// A sales order (quotation) carrying fiscal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOrder {
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub state: OrderState,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub company: CompanyDefaults,
    #[serde(default)]
    pub settings: FiscalSettings,
    #[serde(default)]
    lines: Vec<DocumentLine>,
}

/// Totals as an order form displays them, read off the line collection
/// itself (synthetic lines included) rather than recomputed from scratch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub amount_untaxed: Money,
    pub cassa_amount: Money,
    pub amount_tax: Money,
    pub total_gross: Money,
    pub withholding_amount: Money,
    pub net_amount: Money,
    /// Alias of `net_amount`: what the customer actually pays.
    pub amount_total: Money,
}

// ---------------------------------------------------------------------------
// Order behaviour
// ---------------------------------------------------------------------------

impl SaleOrder {
    pub fn new(reference: impl Into<String>, currency: Currency, company: CompanyDefaults) -> Self {
        let settings = FiscalSettings::from_company(&company);
        Self {
            reference: reference.into(),
            date: None,
            state: OrderState::Draft,
            currency,
            company,
            settings,
            lines: Vec::new(),
        }
    }

    /// Adopt an existing line collection, re-tagging legacy marker names.
    pub fn with_lines(mut self, mut lines: Vec<DocumentLine>) -> Self {
        tag_marker_lines(&mut lines);
        self.lines = lines;
        self
    }

    /// Re-tag marker-named lines after deserializing from name-only host data.
    pub fn normalize(&mut self) {
        tag_marker_lines(&mut self.lines);
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    pub fn confirm(&mut self) {
        if self.state == OrderState::Draft {
            self.state = OrderState::Confirmed;
        }
    }

    // --- change hooks -----------------------------------------------------

    /// Add a line and re-synchronize the fiscal lines.
    pub fn add_line(
        &mut self,
        line: DocumentLine,
        chart: &dyn FiscalLookup,
        ctx: &SyncContext,
    ) -> SyncOutcome {
        self.lines.push(line);
        sync_fiscal_lines(self, chart, ctx)
    }

    /// Remove the line at `index` and re-synchronize.
    pub fn remove_line(
        &mut self,
        index: usize,
        chart: &dyn FiscalLookup,
        ctx: &SyncContext,
    ) -> SyncOutcome {
        if index < self.lines.len() {
            self.lines.remove(index);
        }
        sync_fiscal_lines(self, chart, ctx)
    }

    /// Replace the fiscal settings and re-synchronize.
    pub fn update_settings(
        &mut self,
        settings: FiscalSettings,
        chart: &dyn FiscalLookup,
        ctx: &SyncContext,
    ) -> SyncOutcome {
        if self.is_editable() {
            self.settings = settings;
        }
        sync_fiscal_lines(self, chart, ctx)
    }

    // --- totals -----------------------------------------------------------

    /// Derive the displayed totals from the current line collection: normal
    /// subtotals, the synthetic cassa and withholding line amounts, and each
    /// line's own taxes. Once synchronized this agrees with
    /// [`crate::amounts::compute_amounts`].
    pub fn totals(&self) -> OrderTotals {
        let amount_untaxed: Money = self
            .lines
            .iter()
            .filter(|l| !l.is_fiscal())
            .map(|l| l.subtotal)
            .sum();

        let cassa_amount: Money = self
            .lines
            .iter()
            .filter(|l| l.fiscal_kind == Some(FiscalLineKind::Cassa))
            .map(|l| l.subtotal)
            .sum();

        let withholding_amount: Money = -self
            .lines
            .iter()
            .filter(|l| l.fiscal_kind == Some(FiscalLineKind::Withholding))
            .map(|l| l.subtotal)
            .sum::<Money>();

        // Withholding lines carry no tax, so summing every line's own tax
        // counts normal lines and the cassa line exactly once.
        let amount_tax = round_currency(
            self.lines.iter().map(|l| l.tax_amount()).sum(),
            &self.currency,
        );

        let total_gross = amount_untaxed + cassa_amount + amount_tax;
        let net_amount = round_currency(total_gross - withholding_amount, &self.currency);

        OrderTotals {
            amount_untaxed,
            cassa_amount,
            amount_tax,
            total_gross,
            withholding_amount,
            net_amount,
            amount_total: net_amount,
        }
    }

    /// Label for the VAT column, from the first percent rate found on the
    /// normal lines ("IVA 22%"), or plain "IVA" when the order is untaxed.
    pub fn vat_label(&self) -> String {
        self.lines
            .iter()
            .filter(|l| !l.is_fiscal())
            .flat_map(|l| l.taxes.iter())
            .find_map(|rate| match rate {
                TaxRate::Percent(p) => Some(format!("IVA {p:.0}%")),
                TaxRate::Fixed(_) => None,
            })
            .unwrap_or_else(|| "IVA".to_string())
    }

    /// Draft customer invoice for this order. Fiscal settings travel with the
    /// document; synthetic lines are left behind and regenerate on the
    /// invoice's own sync.
    #[cfg(feature = "invoice")]
    pub fn prepare_invoice(&self) -> crate::invoice::Invoice {
        let normal: Vec<DocumentLine> = self
            .lines
            .iter()
            .filter(|l| !l.is_fiscal())
            .cloned()
            .collect();
        crate::invoice::Invoice::new(
            format!("INV/{}", self.reference),
            self.currency.clone(),
            self.company.clone(),
        )
        .with_settings(self.settings.clone())
        .with_lines(normal)
    }
}

impl FiscalDocument for SaleOrder {
    fn is_editable(&self) -> bool {
        self.state == OrderState::Draft
    }

    fn settings(&self) -> &FiscalSettings {
        &self.settings
    }

    fn currency(&self) -> Currency {
        self.currency.clone()
    }

    fn company(&self) -> &CompanyDefaults {
        &self.company
    }

    fn marker_style(&self) -> MarkerStyle {
        MarkerStyle::AutoTag
    }

    fn default_account(&self) -> Option<AccountRef> {
        Some(AccountRef::new(
            AUTO_SERVICE_CODE,
            "Servizio automatico - calcoli fiscali",
        ))
    }

    fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    fn replace_lines(&mut self, lines: Vec<DocumentLine>, _ctx: &SyncContext) {
        self.lines = lines;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
