use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Result of valuing one position against one price.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Valuation {
    pub cost_basis: Decimal,
    pub market_value: Decimal,
    pub unrealized_pnl: Decimal,
}

/// Summary of one revaluation pass over a portfolio's open positions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RevaluationOutcome {
    /// Open positions considered.
    pub total: usize,
    /// Positions whose cached fields were rewritten.
    pub revalued: usize,
    /// Symbols valued against a quote older than the calculation date.
    pub stale: Vec<String>,
    /// Symbols with no resolvable quote at all; their cached fields were
    /// left untouched rather than fabricated.
    pub unpriced: Vec<String>,
}

impl RevaluationOutcome {
    pub fn is_complete(&self) -> bool {
        self.stale.is_empty() && self.unpriced.is_empty()
    }
}
