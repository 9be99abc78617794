use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Percent};

/// Prefix tag carried by synthetic line names on orders and invoices.
pub const AUTO_MARKER: &str = "[AUTO]";

/// Sequence assigned to ordinary document lines.
pub const NORMAL_LINE_SEQUENCE: u32 = 10;

// ---------------------------------------------------------------------------
// Tax rates
// ---------------------------------------------------------------------------

/// A tax attached to a document line. Only percent-type rates participate in
/// the cassa inflation of the tax base; fixed taxes contribute their flat
/// amount regardless of the base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxRate {
    Percent(Percent),
    Fixed(Money),
}

impl TaxRate {
    pub fn amount_on(&self, base: Money) -> Money {
        match self {
            TaxRate::Percent(rate) => base * rate / dec!(100),
            TaxRate::Fixed(amount) => *amount,
        }
    }
}

// ---------------------------------------------------------------------------
// Synthetic-line discrimination
// ---------------------------------------------------------------------------

/// The two kinds of auto-generated fiscal lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalLineKind {
    Cassa,
    Withholding,
}

impl FiscalLineKind {
    /// Display sequence: fiscal lines sort after all ordinary lines, cassa
    /// before withholding.
    pub fn sequence(&self) -> u32 {
        match self {
            FiscalLineKind::Cassa => 999,
            FiscalLineKind::Withholding => 1000,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FiscalLineKind::Cassa => "cassa",
            FiscalLineKind::Withholding => "withholding",
        }
    }

    /// Recognize the legacy marker-name conventions: an `[AUTO]` prefix on
    /// orders and invoices, plain Italian names on subscriptions. Used only
    /// when adopting lines from hosts that carry no explicit tag; the tag is
    /// the discriminator everywhere else, so a user-entered line that merely
    /// mentions "cassa" is not picked up.
    pub fn from_marker_name(name: &str) -> Option<Self> {
        if name.is_empty() {
            return None;
        }
        let lower = name.to_lowercase();
        if name.trim_start().starts_with(AUTO_MARKER) {
            if lower.contains("cassa") {
                return Some(FiscalLineKind::Cassa);
            }
            if lower.contains("ritenuta") {
                return Some(FiscalLineKind::Withholding);
            }
            return None;
        }
        if lower.starts_with("cassa previdenziale") {
            return Some(FiscalLineKind::Cassa);
        }
        if lower.starts_with("ritenuta d'acconto") {
            return Some(FiscalLineKind::Withholding);
        }
        None
    }
}

/// Naming convention for synthetic lines; one per document type, applied
/// uniformly to creation and recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStyle {
    /// `[AUTO] Cassa Previdenziale 4.0%`, used on orders and invoices.
    AutoTag,
    /// `Cassa previdenziale 4%`, used on subscriptions.
    PlainName,
}

/// Build the display name of a synthetic line.
pub fn marker_name(style: MarkerStyle, kind: FiscalLineKind, percent: Percent) -> String {
    match (style, kind) {
        (MarkerStyle::AutoTag, FiscalLineKind::Cassa) => {
            format!("{AUTO_MARKER} Cassa Previdenziale {percent:.1}%")
        }
        (MarkerStyle::AutoTag, FiscalLineKind::Withholding) => {
            format!("{AUTO_MARKER} Ritenuta d'acconto {percent:.1}%")
        }
        (MarkerStyle::PlainName, FiscalLineKind::Cassa) => {
            format!("Cassa previdenziale {percent}%")
        }
        (MarkerStyle::PlainName, FiscalLineKind::Withholding) => {
            format!("Ritenuta d'acconto {percent}%")
        }
    }
}

// ---------------------------------------------------------------------------
// Document lines
// ---------------------------------------------------------------------------

/// A single line on a sales order, invoice or subscription.
///
/// `fiscal_kind` is the synthetic-line discriminator: `Some(_)` lines are
/// owned by the synchronizer and regenerated on every sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentLine {
    pub name: String,
    pub subtotal: Money,
    #[serde(default)]
    pub taxes: Vec<TaxRate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiscal_kind: Option<FiscalLineKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_code: Option<String>,
    #[serde(default = "default_sequence")]
    pub sequence: u32,
}

fn default_sequence() -> u32 {
    NORMAL_LINE_SEQUENCE
}

impl DocumentLine {
    pub fn new(name: impl Into<String>, subtotal: Money, taxes: Vec<TaxRate>) -> Self {
        Self {
            name: name.into(),
            subtotal,
            taxes,
            fiscal_kind: None,
            account_code: None,
            sequence: NORMAL_LINE_SEQUENCE,
        }
    }

    pub fn is_fiscal(&self) -> bool {
        self.fiscal_kind.is_some()
    }

    /// Tax computed on this line's own subtotal, without cassa inflation.
    pub fn tax_amount(&self) -> Money {
        self.taxes
            .iter()
            .map(|rate| rate.amount_on(self.subtotal))
            .sum()
    }
}

/// Tag untagged lines whose names follow a marker convention. Applied once
/// when adopting a document from name-only host data; returns how many lines
/// were tagged.
pub fn tag_marker_lines(lines: &mut [DocumentLine]) -> usize {
    let mut tagged = 0;
    for line in lines.iter_mut().filter(|l| l.fiscal_kind.is_none()) {
        if let Some(kind) = FiscalLineKind::from_marker_name(&line.name) {
            line.fiscal_kind = Some(kind);
            line.sequence = kind.sequence();
            tagged += 1;
        }
    }
    tagged
}

/// Split a line collection into (normal, fiscal).
pub fn partition_lines(lines: Vec<DocumentLine>) -> (Vec<DocumentLine>, Vec<DocumentLine>) {
    lines.into_iter().partition(|line| !line.is_fiscal())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_tax_amount() {
        let rate = TaxRate::Percent(dec!(22));
        assert_eq!(rate.amount_on(dec!(1000)), dec!(220));
    }

    #[test]
    fn test_fixed_tax_ignores_base() {
        let rate = TaxRate::Fixed(dec!(2));
        assert_eq!(rate.amount_on(dec!(1000)), dec!(2));
        assert_eq!(rate.amount_on(dec!(0)), dec!(2));
    }

    #[test]
    fn test_auto_marker_recognized() {
        assert_eq!(
            FiscalLineKind::from_marker_name("[AUTO] Cassa Previdenziale 4.0%"),
            Some(FiscalLineKind::Cassa)
        );
        assert_eq!(
            FiscalLineKind::from_marker_name("[AUTO] Ritenuta d'acconto 20.0%"),
            Some(FiscalLineKind::Withholding)
        );
    }

    #[test]
    fn test_plain_marker_recognized() {
        assert_eq!(
            FiscalLineKind::from_marker_name("Cassa previdenziale 4%"),
            Some(FiscalLineKind::Cassa)
        );
        assert_eq!(
            FiscalLineKind::from_marker_name("Ritenuta d'acconto 20%"),
            Some(FiscalLineKind::Withholding)
        );
    }

    #[test]
    fn test_user_line_mentioning_cassa_is_not_a_marker() {
        // "Consulenza cassa previdenziale" describes work about the cassa,
        // it is not a synthetic line name.
        assert_eq!(
            FiscalLineKind::from_marker_name("Consulenza cassa previdenziale"),
            None
        );
        assert_eq!(FiscalLineKind::from_marker_name(""), None);
    }

    #[test]
    fn test_untagged_line_is_normal_regardless_of_name() {
        let line = DocumentLine::new("Cassa previdenziale 4%", dec!(40), vec![]);
        assert!(!line.is_fiscal());
    }

    #[test]
    fn test_tag_marker_lines() {
        let mut lines = vec![
            DocumentLine::new("Consulenza legale", dec!(1000), vec![TaxRate::Percent(dec!(22))]),
            DocumentLine::new("[AUTO] Cassa Previdenziale 4.0%", dec!(40), vec![]),
            DocumentLine::new("Ritenuta d'acconto 20%", dec!(-208), vec![]),
        ];
        assert_eq!(tag_marker_lines(&mut lines), 2);
        assert!(!lines[0].is_fiscal());
        assert_eq!(lines[1].fiscal_kind, Some(FiscalLineKind::Cassa));
        assert_eq!(lines[1].sequence, 999);
        assert_eq!(lines[2].fiscal_kind, Some(FiscalLineKind::Withholding));
        assert_eq!(lines[2].sequence, 1000);

        // Second pass finds nothing new
        assert_eq!(tag_marker_lines(&mut lines), 0);
    }

    #[test]
    fn test_marker_names() {
        assert_eq!(
            marker_name(MarkerStyle::AutoTag, FiscalLineKind::Cassa, dec!(4)),
            "[AUTO] Cassa Previdenziale 4.0%"
        );
        assert_eq!(
            marker_name(MarkerStyle::PlainName, FiscalLineKind::Withholding, dec!(20)),
            "Ritenuta d'acconto 20%"
        );
    }

    #[test]
    fn test_partition_lines() {
        let mut lines = vec![
            DocumentLine::new("Servizio", dec!(500), vec![]),
            DocumentLine::new("[AUTO] Cassa Previdenziale 4.0%", dec!(20), vec![]),
        ];
        tag_marker_lines(&mut lines);
        let (normal, fiscal) = partition_lines(lines);
        assert_eq!(normal.len(), 1);
        assert_eq!(fiscal.len(), 1);
    }
}
