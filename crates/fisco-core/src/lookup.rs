use serde::{Deserialize, Serialize};

use crate::line::FiscalLineKind;
use crate::settings::CompanyDefaults;
use crate::types::Percent;

/// Conventional code prefix for the service-revenue account the cassa line
/// posts to.
pub const CASSA_ACCOUNT_PREFIX: &str = "701";

/// Conventional code prefix for the withholding tax-credit account.
pub const WITHHOLDING_ACCOUNT_PREFIX: &str = "144";

/// A reference into the host's chart of accounts (or product catalog).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRef {
    pub code: String,
    pub name: String,
}

impl AccountRef {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// Read-only view of the host's chart of accounts.
pub trait FiscalLookup {
    fn account_by_code(&self, code: &str) -> Option<AccountRef>;
    fn account_by_prefix(&self, prefix: &str) -> Option<AccountRef>;
    /// The sale tax applied to cassa lines, when one is configured (22% VAT
    /// in the standard Italian chart).
    fn default_sale_tax(&self) -> Option<Percent>;
}

/// Best-effort account resolution for a fiscal line: configured reference,
/// then conventional code prefix, then the document's default account. A
/// fully unresolved account is reported as a warning, never an error; the
/// line is still created.
pub fn resolve_fiscal_account(
    kind: FiscalLineKind,
    company: &CompanyDefaults,
    chart: &dyn FiscalLookup,
    document_default: Option<&AccountRef>,
) -> (Option<AccountRef>, Vec<String>) {
    let mut warnings = Vec::new();

    let (configured, prefix) = match kind {
        FiscalLineKind::Cassa => (company.cassa_account_code.as_deref(), CASSA_ACCOUNT_PREFIX),
        FiscalLineKind::Withholding => (
            company.withholding_account_code.as_deref(),
            WITHHOLDING_ACCOUNT_PREFIX,
        ),
    };

    if let Some(code) = configured {
        match chart.account_by_code(code) {
            Some(account) => return (Some(account), warnings),
            None => warnings.push(format!(
                "Configured {} account '{}' not found in chart; falling back",
                kind.label(),
                code
            )),
        }
    }

    if let Some(account) = chart.account_by_prefix(prefix) {
        return (Some(account), warnings);
    }

    match document_default {
        Some(account) => (Some(account.clone()), warnings),
        None => {
            warnings.push(format!(
                "No account resolved for {} line; line created without account",
                kind.label()
            ));
            (None, warnings)
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory chart
// ---------------------------------------------------------------------------

/// Map-backed chart of accounts for the CLI, bindings and tests.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryChart {
    #[serde(default)]
    pub accounts: Vec<AccountRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_tax_percent: Option<Percent>,
}

impl InMemoryChart {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Starter chart following Italian numbering conventions.
    pub fn italian_defaults() -> Self {
        use rust_decimal_macros::dec;
        Self {
            accounts: vec![
                AccountRef::new("701000", "Ricavi per prestazioni di servizi"),
                AccountRef::new("144000", "Crediti per ritenute subite"),
            ],
            sale_tax_percent: Some(dec!(22)),
        }
    }
}

impl FiscalLookup for InMemoryChart {
    fn account_by_code(&self, code: &str) -> Option<AccountRef> {
        self.accounts.iter().find(|a| a.code == code).cloned()
    }

    fn account_by_prefix(&self, prefix: &str) -> Option<AccountRef> {
        self.accounts
            .iter()
            .find(|a| a.code.starts_with(prefix))
            .cloned()
    }

    fn default_sale_tax(&self) -> Option<Percent> {
        self.sale_tax_percent
    }
}
