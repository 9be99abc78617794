use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FiscoError;
use crate::line::{marker_name, partition_lines, DocumentLine, FiscalLineKind, MarkerStyle, TaxRate};
use crate::lookup::{resolve_fiscal_account, AccountRef, FiscalLookup};
use crate::settings::{CompanyDefaults, FiscalSettings};
use crate::types::{round_currency, Currency, Money};

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// What the synchronizer needs from a host document. Document types attach
/// fiscal behaviour by implementing this trait; no fields are injected into
/// the host model.
pub trait FiscalDocument {
    fn is_editable(&self) -> bool;
    fn settings(&self) -> &FiscalSettings;
    fn currency(&self) -> Currency;
    fn company(&self) -> &CompanyDefaults;
    /// Naming convention for this document type's synthetic lines.
    fn marker_style(&self) -> MarkerStyle;
    /// Last-resort account when neither the configured reference nor the
    /// conventional code resolves.
    fn default_account(&self) -> Option<AccountRef>;
    fn lines(&self) -> &[DocumentLine];
    /// Raw line storage. Callers pass a suppressed context so the write does
    /// not re-enter the synchronizer through the document's change hooks.
    fn replace_lines(&mut self, lines: Vec<DocumentLine>, ctx: &SyncContext);
}

// ---------------------------------------------------------------------------
// Re-entrancy guard
// ---------------------------------------------------------------------------

/// Explicit re-entrancy guard threaded through every mutating call.
///
/// The synchronizer derives a suppressed child context for its own writes, so
/// change hooks fired by those writes short-circuit instead of recursing.
/// Being a plain value, the guard is released by scope exit even when a line
/// build fails; there is no global state to clear.
#[derive(Debug, Clone, Default)]
pub struct SyncContext {
    suppress_fiscal_sync: bool,
}

impl SyncContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_fiscal_sync
    }

    /// Child context under which fiscal synchronization is suppressed.
    pub fn suppressed(&self) -> Self {
        Self {
            suppress_fiscal_sync: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The call arrived under a suppressed context.
    Reentrant,
    /// The document has left its editable lifecycle state.
    NotEditable,
}

/// What a sync call did to the document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncOutcome {
    pub changed: bool,
    pub cassa_line_created: bool,
    pub withholding_line_created: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped: Option<SkipReason>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl SyncOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Synchronization
// ---------------------------------------------------------------------------

/// Reconcile the document's synthetic fiscal lines with its current settings.
///
/// Idempotent: with unchanged normal lines and settings the resulting line
/// collection is identical, so at most one cassa line and one withholding
/// line ever exist. A failure building one fiscal line is logged and does not
/// block the other, nor the overall document save.
pub fn sync_fiscal_lines<D: FiscalDocument + ?Sized>(
    doc: &mut D,
    chart: &dyn FiscalLookup,
    ctx: &SyncContext,
) -> SyncOutcome {
    if ctx.is_suppressed() {
        return SyncOutcome::skipped(SkipReason::Reentrant);
    }
    if !doc.is_editable() {
        debug!("fiscal sync skipped: document not editable");
        return SyncOutcome::skipped(SkipReason::NotEditable);
    }

    let settings = doc.settings().clone();
    let style = doc.marker_style();
    let company = doc.company().clone();
    let currency = doc.currency();
    let document_default = doc.default_account();
    let before = doc.lines().to_vec();

    let (mut lines, _stale_fiscal) = partition_lines(before.clone());
    let base_amount: Money = lines.iter().map(|l| l.subtotal).sum();

    let mut outcome = SyncOutcome::default();

    if base_amount != Decimal::ZERO {
        let mut cassa_amount = Decimal::ZERO;

        if settings.cassa_active() {
            match build_cassa_line(
                base_amount,
                &settings,
                style,
                &currency,
                &company,
                chart,
                document_default.as_ref(),
            ) {
                Ok((line, warnings)) => {
                    cassa_amount = line.subtotal;
                    outcome.cassa_line_created = true;
                    outcome.warnings.extend(warnings);
                    lines.push(line);
                }
                Err(e) => {
                    warn!(error = %e, "cassa line skipped");
                    outcome.warnings.push(e.to_string());
                }
            }
        }

        if settings.withholding_active() {
            let withholding_base = if settings.apply_cassa {
                base_amount + cassa_amount
            } else {
                base_amount
            };
            match build_withholding_line(
                withholding_base,
                &settings,
                style,
                &currency,
                &company,
                chart,
                document_default.as_ref(),
            ) {
                Ok((line, warnings)) => {
                    outcome.withholding_line_created = true;
                    outcome.warnings.extend(warnings);
                    lines.push(line);
                }
                Err(e) => {
                    warn!(error = %e, "withholding line skipped");
                    outcome.warnings.push(e.to_string());
                }
            }
        }
    }

    outcome.changed = lines != before;
    if outcome.changed {
        doc.replace_lines(lines, &ctx.suppressed());
    }
    outcome
}

fn build_cassa_line(
    base_amount: Money,
    settings: &FiscalSettings,
    style: MarkerStyle,
    currency: &Currency,
    company: &CompanyDefaults,
    chart: &dyn FiscalLookup,
    document_default: Option<&AccountRef>,
) -> Result<(DocumentLine, Vec<String>), FiscoError> {
    let amount = base_amount
        .checked_mul(settings.cassa_percent)
        .map(|v| round_currency(v / dec!(100), currency))
        .ok_or_else(|| FiscoError::LineCreation {
            kind: "cassa".to_string(),
            reason: format!("Overflow computing {}% of {}", settings.cassa_percent, base_amount),
        })?;

    let (account, mut warnings) =
        resolve_fiscal_account(FiscalLineKind::Cassa, company, chart, document_default);

    let taxes = match chart.default_sale_tax() {
        Some(rate) => vec![TaxRate::Percent(rate)],
        None => {
            warnings.push("No sale tax configured; cassa line created untaxed".to_string());
            Vec::new()
        }
    };

    let line = DocumentLine {
        name: marker_name(style, FiscalLineKind::Cassa, settings.cassa_percent),
        subtotal: amount,
        taxes,
        fiscal_kind: Some(FiscalLineKind::Cassa),
        account_code: account.map(|a| a.code),
        sequence: FiscalLineKind::Cassa.sequence(),
    };
    Ok((line, warnings))
}

fn build_withholding_line(
    withholding_base: Money,
    settings: &FiscalSettings,
    style: MarkerStyle,
    currency: &Currency,
    company: &CompanyDefaults,
    chart: &dyn FiscalLookup,
    document_default: Option<&AccountRef>,
) -> Result<(DocumentLine, Vec<String>), FiscoError> {
    let amount = withholding_base
        .checked_mul(settings.withholding_percent)
        .map(|v| round_currency(v / dec!(100), currency))
        .ok_or_else(|| FiscoError::LineCreation {
            kind: "withholding".to_string(),
            reason: format!(
                "Overflow computing {}% of {}",
                settings.withholding_percent, withholding_base
            ),
        })?;

    let (account, warnings) =
        resolve_fiscal_account(FiscalLineKind::Withholding, company, chart, document_default);

    // Negative: the withholding reduces the payable total. No tax applies.
    let line = DocumentLine {
        name: marker_name(style, FiscalLineKind::Withholding, settings.withholding_percent),
        subtotal: -amount,
        taxes: Vec::new(),
        fiscal_kind: Some(FiscalLineKind::Withholding),
        account_code: account.map(|a| a.code),
        sequence: FiscalLineKind::Withholding.sequence(),
    };
    Ok((line, warnings))
}
