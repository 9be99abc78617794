use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::FiscoError;
use crate::types::Percent;
use crate::FiscoResult;

/// Company-level configuration from which document defaults are sourced.
///
/// The account codes are optional references into the chart of accounts; when
/// absent the synchronizer falls back to conventional code prefixes and then
/// to the document's own default account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyDefaults {
    #[serde(default)]
    pub enable_withholding_tax: bool,
    #[serde(default)]
    pub enable_cassa_previdenziale: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cassa_account_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withholding_account_code: Option<String>,
}

pub fn default_cassa_percent() -> Percent {
    dec!(4)
}

pub fn default_withholding_percent() -> Percent {
    dec!(20)
}

/// Per-document fiscal settings. Always present on a document; mutable only
/// while the document is in an editable lifecycle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiscalSettings {
    #[serde(default)]
    pub apply_cassa: bool,
    #[serde(default = "default_cassa_percent")]
    pub cassa_percent: Percent,
    #[serde(default)]
    pub apply_withholding: bool,
    #[serde(default = "default_withholding_percent")]
    pub withholding_percent: Percent,
}

impl Default for FiscalSettings {
    fn default() -> Self {
        Self {
            apply_cassa: false,
            cassa_percent: default_cassa_percent(),
            apply_withholding: false,
            withholding_percent: default_withholding_percent(),
        }
    }
}

impl FiscalSettings {
    /// Settings for a new document, seeded from the company configuration.
    pub fn from_company(company: &CompanyDefaults) -> Self {
        Self {
            apply_cassa: company.enable_cassa_previdenziale,
            apply_withholding: company.enable_withholding_tax,
            ..Self::default()
        }
    }

    /// True when a cassa line should exist on the document.
    pub fn cassa_active(&self) -> bool {
        self.apply_cassa && self.cassa_percent > Decimal::ZERO
    }

    /// True when a withholding line should exist on the document.
    pub fn withholding_active(&self) -> bool {
        self.apply_withholding && self.withholding_percent > Decimal::ZERO
    }

    /// Reject negative percentages; flag implausibly large ones as warnings.
    pub fn validate(&self) -> FiscoResult<Vec<String>> {
        let mut warnings = Vec::new();

        if self.cassa_percent < Decimal::ZERO {
            return Err(FiscoError::InvalidInput {
                field: "cassa_percent".to_string(),
                reason: "Percentage cannot be negative".to_string(),
            });
        }
        if self.withholding_percent < Decimal::ZERO {
            return Err(FiscoError::InvalidInput {
                field: "withholding_percent".to_string(),
                reason: "Percentage cannot be negative".to_string(),
            });
        }

        if self.cassa_percent > dec!(100) {
            warnings.push(format!(
                "Cassa percentage {}% exceeds 100%",
                self.cassa_percent
            ));
        }
        if self.withholding_percent > dec!(100) {
            warnings.push(format!(
                "Withholding percentage {}% exceeds 100%",
                self.withholding_percent
            ));
        }

        Ok(warnings)
    }
}
