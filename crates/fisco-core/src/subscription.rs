use serde::{Deserialize, Serialize};

use crate::amounts::compute_amounts;
use crate::line::{tag_marker_lines, DocumentLine, MarkerStyle};
use crate::lookup::{AccountRef, FiscalLookup};
use crate::settings::{CompanyDefaults, FiscalSettings};
use crate::sync::{sync_fiscal_lines, FiscalDocument, SyncContext, SyncOutcome};
use crate::types::{Currency, Money};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Subscriptions stay fiscally editable while running: recurring lines keep
/// changing over the contract's life, so both Draft and Open accept syncs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    #[default]
    Draft,
    Open,
    Closed,
    Cancelled,
}

/// A recurring contract whose periodic invoice carries the fiscal add-ons.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub reference: String,
    #[serde(default)]
    pub state: SubscriptionState,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub company: CompanyDefaults,
    #[serde(default)]
    pub settings: FiscalSettings,
    #[serde(default)]
    lines: Vec<DocumentLine>,
}

/// Per-period totals, phrased the way the subscription form shows them:
/// recurring aggregates first, fiscal add-ons on top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionTotals {
    pub recurring_untaxed: Money,
    pub recurring_tax: Money,
    pub recurring_total: Money,
    pub cassa_amount: Money,
    pub total_gross: Money,
    pub withholding_amount: Money,
    pub net_amount: Money,
}

// ---------------------------------------------------------------------------
// Subscription behaviour
// ---------------------------------------------------------------------------

impl Subscription {
    pub fn new(reference: impl Into<String>, currency: Currency, company: CompanyDefaults) -> Self {
        let settings = FiscalSettings::from_company(&company);
        Self {
            reference: reference.into(),
            state: SubscriptionState::Draft,
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

    pub fn open(&mut self) {
        if self.state == SubscriptionState::Draft {
            self.state = SubscriptionState::Open;
        }
    }

    pub fn close(&mut self) {
        self.state = SubscriptionState::Closed;
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

    /// Informational notice shown when fiscal settings change on a populated
    /// subscription: the lines update on the next save, not immediately.
    pub fn settings_change_notice(&self) -> Option<String> {
        if !self.is_editable() {
            return None;
        }
        let has_normal_lines = self.lines.iter().any(|l| !l.is_fiscal());
        if has_normal_lines && (self.settings.apply_cassa || self.settings.apply_withholding) {
            Some(
                "Le righe fiscali verranno aggiornate automaticamente al salvataggio".to_string(),
            )
        } else {
            None
        }
    }

    // --- totals -----------------------------------------------------------

    /// Per-period totals. The fiscal math is the canonical computation; the
    /// recurring aggregates are read off the normal lines.
    pub fn totals(&self) -> SubscriptionTotals {
        let amounts = compute_amounts(&self.lines, &self.settings, &self.currency);
        SubscriptionTotals {
            recurring_untaxed: amounts.untaxed_base,
            recurring_tax: amounts.tax_amount,
            recurring_total: amounts.untaxed_base + amounts.tax_amount,
            cassa_amount: amounts.cassa_amount,
            total_gross: amounts.gross_total,
            withholding_amount: amounts.withholding_amount,
            net_amount: amounts.net_amount,
        }
    }

    // --- downstream documents ---------------------------------------------

    /// Renewal contract: fresh draft, same recurring lines, fiscal settings
    /// carried over. Synthetic lines regenerate on the renewal's own sync.
    pub fn renew(&self, reference: impl Into<String>) -> Subscription {
        let normal: Vec<DocumentLine> = self
            .lines
            .iter()
            .filter(|l| !l.is_fiscal())
            .cloned()
            .collect();
        Subscription {
            reference: reference.into(),
            state: SubscriptionState::Draft,
            currency: self.currency.clone(),
            company: self.company.clone(),
            settings: self.settings.clone(),
            lines: normal,
        }
    }

    /// Draft invoice for the current period, fiscal settings transferred.
    #[cfg(feature = "invoice")]
    pub fn prepare_invoice(&self, reference: impl Into<String>) -> crate::invoice::Invoice {
        let normal: Vec<DocumentLine> = self
            .lines
            .iter()
            .filter(|l| !l.is_fiscal())
            .cloned()
            .collect();
        crate::invoice::Invoice::new(reference, self.currency.clone(), self.company.clone())
            .with_settings(self.settings.clone())
            .with_lines(normal)
    }
}

impl FiscalDocument for Subscription {
    fn is_editable(&self) -> bool {
        matches!(
            self.state,
            SubscriptionState::Draft | SubscriptionState::Open
        )
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
        MarkerStyle::PlainName
    }

    fn default_account(&self) -> Option<AccountRef> {
        None
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
    use crate::line::{FiscalLineKind, TaxRate};
    use crate::lookup::InMemoryChart;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn subscription_with(settings: FiscalSettings) -> Subscription {
        let mut sub = Subscription::new("SUB/001", Currency::EUR, CompanyDefaults::default());
        sub.settings = settings;
        sub
    }

    fn both_on() -> FiscalSettings {
        FiscalSettings {
            apply_cassa: true,
            apply_withholding: true,
            ..Default::default()
        }
    }

    fn hosting(subtotal: Money) -> DocumentLine {
        DocumentLine::new("Canone mensile", subtotal, vec![TaxRate::Percent(dec!(22))])
    }

    #[test]
    fn test_plain_italian_marker_names() {
        let mut sub = subscription_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        sub.add_line(hosting(dec!(1000)), &chart, &SyncContext::new());

        assert_eq!(sub.lines()[1].name, "Cassa previdenziale 4%");
        assert_eq!(sub.lines()[2].name, "Ritenuta d'acconto 20%");
    }

    #[test]
    fn test_open_subscription_still_syncs() {
        let mut sub = subscription_with(both_on());
        sub.open();
        let chart = InMemoryChart::italian_defaults();
        let outcome = sub.add_line(hosting(dec!(1000)), &chart, &SyncContext::new());

        assert!(outcome.cassa_line_created);
        assert_eq!(sub.lines().len(), 3);
    }

    #[test]
    fn test_closed_subscription_is_frozen() {
        let mut sub = subscription_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        sub.add_line(hosting(dec!(1000)), &chart, &SyncContext::new());
        sub.close();

        let outcome = sub.update_settings(FiscalSettings::default(), &chart, &SyncContext::new());
        assert!(outcome.skipped.is_some());
        assert_eq!(sub.lines().len(), 3);
    }

    #[test]
    fn test_totals_recurring_view() {
        let mut sub = subscription_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        sub.add_line(hosting(dec!(1000)), &chart, &SyncContext::new());

        let totals = sub.totals();
        assert_eq!(totals.recurring_untaxed, dec!(1000));
        assert_eq!(totals.recurring_tax, dec!(228.80));
        assert_eq!(totals.recurring_total, dec!(1228.80));
        assert_eq!(totals.cassa_amount, dec!(40.00));
        assert_eq!(totals.total_gross, dec!(1268.80));
        assert_eq!(totals.withholding_amount, dec!(208.00));
        assert_eq!(totals.net_amount, dec!(1060.80));
    }

    #[test]
    fn test_renewal_carries_settings() {
        let mut sub = subscription_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        sub.add_line(hosting(dec!(1000)), &chart, &SyncContext::new());

        let renewal = sub.renew("SUB/001-R");
        assert_eq!(renewal.state, SubscriptionState::Draft);
        assert_eq!(renewal.lines().len(), 1);
        assert!(renewal.settings.apply_cassa);
        assert!(renewal.settings.apply_withholding);
        assert_eq!(renewal.settings.cassa_percent, dec!(4));
    }

    #[test]
    fn test_settings_change_notice() {
        let mut sub = subscription_with(both_on());
        assert_eq!(sub.settings_change_notice(), None);

        let chart = InMemoryChart::italian_defaults();
        sub.add_line(hosting(dec!(1000)), &chart, &SyncContext::new());
        assert!(sub.settings_change_notice().is_some());

        sub.close();
        assert_eq!(sub.settings_change_notice(), None);
    }

    #[test]
    fn test_subscription_marker_roundtrip() {
        // Lines deserialized from name-only host data are re-tagged and the
        // next sync does not duplicate them
        let mut sub = subscription_with(both_on()).with_lines(vec![
            hosting(dec!(1000)),
            DocumentLine::new("Cassa previdenziale 4%", dec!(40), vec![]),
            DocumentLine::new("Ritenuta d'acconto 20%", dec!(-208), vec![]),
        ]);
        assert_eq!(sub.lines()[1].fiscal_kind, Some(FiscalLineKind::Cassa));

        let chart = InMemoryChart::italian_defaults();
        sync_fiscal_lines(&mut sub, &chart, &SyncContext::new());
        assert_eq!(sub.lines().len(), 3);
        assert_eq!(sub.totals().net_amount, dec!(1060.80));
    }

    #[test]
    fn test_zero_base_no_fiscal_lines() {
        let mut sub = subscription_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        let outcome = sync_fiscal_lines(&mut sub, &chart, &SyncContext::new());

        assert!(!outcome.cassa_line_created);
        assert!(sub.lines().is_empty());
        assert_eq!(sub.totals().net_amount, Decimal::ZERO);
    }

    #[cfg(feature = "invoice")]
    #[test]
    fn test_prepare_invoice_transfers_settings() {
        let mut sub = subscription_with(both_on());
        let chart = InMemoryChart::italian_defaults();
        sub.add_line(hosting(dec!(1000)), &chart, &SyncContext::new());

        let invoice = sub.prepare_invoice("INV/SUB/001");
        assert_eq!(invoice.lines().len(), 1);
        assert!(invoice.settings.apply_cassa);
        assert!(invoice.settings.apply_withholding);
        assert_eq!(invoice.fiscal_amounts().net_amount, dec!(1060.80));
    }
}
