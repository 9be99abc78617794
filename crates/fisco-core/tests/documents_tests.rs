#![cfg(all(feature = "sale_order", feature = "invoice"))]

use fisco_core::amounts::compute_amounts;
use fisco_core::line::{DocumentLine, TaxRate};
use fisco_core::lookup::InMemoryChart;
use fisco_core::sale_order::SaleOrder;
use fisco_core::settings::{CompanyDefaults, FiscalSettings};
use fisco_core::sync::{sync_fiscal_lines, SyncContext};
use fisco_core::types::Currency;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fiscal_company() -> CompanyDefaults {
    CompanyDefaults {
        enable_withholding_tax: true,
        enable_cassa_previdenziale: true,
        ..Default::default()
    }
}

fn consulting(subtotal: Decimal) -> DocumentLine {
    DocumentLine::new("Consulenza", subtotal, vec![TaxRate::Percent(dec!(22))])
}

// ===========================================================================
// Quote to invoice
// ===========================================================================

#[test]
fn test_company_defaults_seed_new_documents() {
    let order = SaleOrder::new("SO/1", Currency::EUR, fiscal_company());
    assert!(order.settings.apply_cassa);
    assert!(order.settings.apply_withholding);
    assert_eq!(order.settings.cassa_percent, dec!(4));
    assert_eq!(order.settings.withholding_percent, dec!(20));
}

#[test]
fn test_quote_and_invoice_agree_on_the_payable() {
    let chart = InMemoryChart::italian_defaults();
    let ctx = SyncContext::new();

    let mut order = SaleOrder::new("SO/1", Currency::EUR, fiscal_company());
    order.add_line(consulting(dec!(1000)), &chart, &ctx);

    let mut invoice = order.prepare_invoice();
    sync_fiscal_lines(&mut invoice, &chart, &ctx);

    assert_eq!(order.totals().amount_total, invoice.fiscal_amounts().net_amount);
    assert_eq!(invoice.lines().len(), 3);
}

#[test]
fn test_order_line_view_matches_recomputation() {
    // The order derives totals from its lines, the invoice recomputes from
    // scratch; after a sync both readings coincide
    let chart = InMemoryChart::italian_defaults();
    let ctx = SyncContext::new();

    let mut order = SaleOrder::new("SO/2", Currency::EUR, fiscal_company());
    order.add_line(consulting(dec!(640)), &chart, &ctx);
    order.add_line(consulting(dec!(360)), &chart, &ctx);

    let totals = order.totals();
    let recomputed = compute_amounts(order.lines(), &order.settings, &order.currency);
    assert_eq!(totals.amount_untaxed, recomputed.untaxed_base);
    assert_eq!(totals.cassa_amount, recomputed.cassa_amount);
    assert_eq!(totals.amount_tax, recomputed.tax_amount);
    assert_eq!(totals.net_amount, recomputed.net_amount);
}

#[test]
fn test_settings_survive_document_handoff() {
    let chart = InMemoryChart::italian_defaults();
    let ctx = SyncContext::new();

    let mut order = SaleOrder::new("SO/3", Currency::EUR, fiscal_company());
    let custom = FiscalSettings {
        apply_cassa: true,
        cassa_percent: dec!(5),
        apply_withholding: true,
        withholding_percent: dec!(23),
    };
    order.update_settings(custom.clone(), &chart, &ctx);
    order.add_line(consulting(dec!(1000)), &chart, &ctx);

    let invoice = order.prepare_invoice();
    assert_eq!(invoice.settings, custom);
}

// ===========================================================================
// Subscription flows
// ===========================================================================

#[cfg(feature = "subscription")]
mod subscription_flows {
    use super::*;
    use fisco_core::subscription::Subscription;

    #[test]
    fn test_subscription_invoice_and_renewal_chain() {
        let chart = InMemoryChart::italian_defaults();
        let ctx = SyncContext::new();

        let mut sub = Subscription::new("SUB/9", Currency::EUR, fiscal_company());
        sub.add_line(consulting(dec!(1000)), &chart, &ctx);
        sub.open();

        let mut invoice = sub.prepare_invoice("INV/SUB/9");
        sync_fiscal_lines(&mut invoice, &chart, &ctx);
        assert_eq!(invoice.fiscal_amounts().net_amount, dec!(1060.80));

        let mut renewal = sub.renew("SUB/9-R");
        sync_fiscal_lines(&mut renewal, &chart, &ctx);
        assert_eq!(renewal.totals().net_amount, dec!(1060.80));
        // Plain Italian names on the subscription, [AUTO] tags on the invoice
        assert_eq!(renewal.lines()[1].name, "Cassa previdenziale 4%");
        assert_eq!(invoice.lines()[1].name, "[AUTO] Cassa Previdenziale 4.0%");
    }

    #[test]
    fn test_subscription_settings_reach_the_invoice() {
        let chart = InMemoryChart::italian_defaults();
        let ctx = SyncContext::new();

        let mut sub = Subscription::new("SUB/10", Currency::EUR, fiscal_company());
        let mut settings = sub.settings.clone();
        settings.withholding_percent = dec!(23);
        sub.update_settings(settings, &chart, &ctx);
        sub.add_line(consulting(dec!(500)), &chart, &ctx);

        let invoice = sub.prepare_invoice("INV/SUB/10");
        assert_eq!(invoice.settings.withholding_percent, dec!(23));
    }
}
