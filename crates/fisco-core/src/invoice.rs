use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::amounts::{compute_amounts, ComputedAmounts};
use crate::line::{tag_marker_lines, DocumentLine, MarkerStyle};
use crate::lookup::{AccountRef, FiscalLookup};
use crate::settings::{CompanyDefaults, FiscalSettings};
use crate::sync::{sync_fiscal_lines, FiscalDocument, SyncContext, SyncOutcome};
use crate::types::Currency;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which journal the document belongs to. Fiscal add-ons only apply to
/// customer documents; vendor bills flow through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceKind {
    #[default]
    CustomerInvoice,
    CustomerRefund,
    VendorBill,
    VendorRefund,
}

impl InvoiceKind {
    pub fn is_customer_document(&self) -> bool {
        matches!(self, InvoiceKind::CustomerInvoice | InvoiceKind::CustomerRefund)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceState {
    #[default]
    Draft,
    Posted,
    Cancelled,
}

/// A customer invoice (or refund) carrying fiscal settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub kind: InvoiceKind,
    #[serde(default)]
    pub state: InvoiceState,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub company: CompanyDefaults,
    #[serde(default)]
    pub settings: FiscalSettings,
    /// Default account of the invoice's journal, used as the last fallback
    /// when resolving fiscal-line accounts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal_default_account: Option<AccountRef>,
    #[serde(default)]
    lines: Vec<DocumentLine>,
}

// ---------------------------------------------------------------------------
// Invoice behaviour
// ---------------------------------------------------------------------------

impl Invoice {
    pub fn new(reference: impl Into<String>, currency: Currency, company: CompanyDefaults) -> Self {
        let settings = FiscalSettings::from_company(&company);
        Self {
            reference: reference.into(),
            date: None,
            kind: InvoiceKind::CustomerInvoice,
            state: InvoiceState::Draft,
            currency,
            company,
            settings,
            journal_default_account: None,
            lines: Vec::new(),
        }
    }

    pub fn with_settings(mut self, settings: FiscalSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Adopt an existing line collection, re-tagging legacy marker names.
    pub fn with_lines(mut self, mut lines: Vec<DocumentLine>) -> Self {
        tag_marker_lines(&mut lines);
        self.lines = lines;
        self
    }

    pub fn with_kind(mut self, kind: InvoiceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Re-tag marker-named lines after deserializing from name-only host data.
    pub fn normalize(&mut self) {
        tag_marker_lines(&mut self.lines);
    }

    pub fn lines(&self) -> &[DocumentLine] {
        &self.lines
    }

    pub fn post(&mut self) {
        if self.state == InvoiceState::Draft {
            self.state = InvoiceState::Posted;
        }
    }

    // --- change hooks -----------------------------------------------------

    pub fn add_line(
        &mut self,
        line: DocumentLine,
        chart: &dyn FiscalLookup,
        ctx: &SyncContext,
    ) -> SyncOutcome {
        self.lines.push(line);
        sync_fiscal_lines(self, chart, ctx)
    }

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

    /// Fiscal totals recomputed from scratch off the normal lines, the
    /// canonical ordering. Unlike the order form this does not read the
    /// synthetic lines back; it is the reference computation for reports and
    /// the registered payable amount.
    pub fn fiscal_amounts(&self) -> ComputedAmounts {
        if !self.kind.is_customer_document() {
            return ComputedAmounts::zero();
        }
        compute_amounts(&self.lines, &self.settings, &self.currency)
    }
}

impl FiscalDocument for Invoice {
    fn is_editable(&self) -> bool {
        self.state == InvoiceState::Draft && self.kind.is_customer_document()
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
        self.journal_default_account.clone()
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::TaxRate;
    use crate::lookup::InMemoryChart;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn invoice_with(settings: FiscalSettings) -> Invoice {
        Invoice::new("INV/2025/0001", Currency::EUR, CompanyDefaults::default())
            .with_settings(settings)
    }

    fn both_on() -> FiscalSettings {
        FiscalSettings {
            apply_cassa: true,
            apply_withholding: true,
            ..Default::default()
        }
    }

    fn service(subtotal: rust_decimal::Decimal) -> DocumentLine {
        DocumentLine::new(
            "Prestazione professionale",
            subtotal,
            vec![TaxRate::Percent(dec!(22))],
        )
    }

    #[test]
    fn test_fiscal_amounts_reference_scenario() {
        let mut invoice = invoice_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        invoice.add_line(service(dec!(1000)), &chart, &SyncContext::new());

        let amounts = invoice.fiscal_amounts();
        assert_eq!(amounts.untaxed_base, dec!(1000));
        assert_eq!(amounts.cassa_amount, dec!(40.00));
        assert_eq!(amounts.tax_amount, dec!(228.80));
        assert_eq!(amounts.gross_total, dec!(1268.80));
        assert_eq!(amounts.withholding_amount, dec!(208.00));
        assert_eq!(amounts.net_amount, dec!(1060.80));
    }

    #[test]
    fn test_sync_resolves_journal_fallback() {
        let mut invoice = invoice_with(both_on());
        invoice.journal_default_account = Some(AccountRef::new("700000", "Ricavi generici"));
        let chart = InMemoryChart::empty();
        invoice.add_line(service(dec!(1000)), &chart, &SyncContext::new());

        assert_eq!(invoice.lines()[1].account_code.as_deref(), Some("700000"));
        assert_eq!(invoice.lines()[2].account_code.as_deref(), Some("700000"));
    }

    #[test]
    fn test_posted_invoice_is_frozen() {
        let mut invoice = invoice_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        invoice.add_line(service(dec!(1000)), &chart, &SyncContext::new());
        invoice.post();

        let outcome = invoice.add_line(service(dec!(500)), &chart, &SyncContext::new());
        assert!(outcome.skipped.is_some());
        // The line went in, but no fiscal re-sync happened
        assert_eq!(invoice.lines().len(), 4);
        assert_eq!(invoice.lines()[1].subtotal, dec!(40.00));
    }

    #[test]
    fn test_vendor_bill_gets_no_fiscal_lines() {
        let mut invoice = invoice_with(both_on()).with_kind(InvoiceKind::VendorBill);
        let chart = InMemoryChart::italian_defaults();
        let outcome = invoice.add_line(service(dec!(1000)), &chart, &SyncContext::new());

        assert!(outcome.skipped.is_some());
        assert_eq!(invoice.lines().len(), 1);
        assert_eq!(invoice.fiscal_amounts(), ComputedAmounts::zero());
    }

    #[test]
    fn test_customer_refund_flows_negative() {
        let mut refund = invoice_with(both_on()).with_kind(InvoiceKind::CustomerRefund);
        let chart = InMemoryChart::italian_defaults();
        refund.add_line(service(dec!(-1000)), &chart, &SyncContext::new());

        assert_eq!(refund.lines().len(), 3);
        assert_eq!(refund.lines()[1].subtotal, dec!(-40.00));
        assert_eq!(refund.lines()[2].subtotal, dec!(208.00));
        assert_eq!(refund.fiscal_amounts().net_amount, dec!(-1060.80));
    }

    #[test]
    fn test_update_settings_recomputes() {
        let mut invoice = invoice_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        invoice.add_line(service(dec!(1000)), &chart, &SyncContext::new());

        let mut settings = invoice.settings.clone();
        settings.apply_cassa = false;
        invoice.update_settings(settings, &chart, &SyncContext::new());

        let amounts = invoice.fiscal_amounts();
        assert_eq!(amounts.cassa_amount, Decimal::ZERO);
        assert_eq!(amounts.withholding_amount, dec!(200.00));
        assert_eq!(invoice.lines().len(), 2);
    }
}
