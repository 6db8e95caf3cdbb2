//! Term-structure metrics

use rust_decimal::Decimal;
use serde::Serialize;

/// Shape of the curve between a near and a far contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketStructure {
    /// Far trades at or above near
    Contango,
    /// Far trades below near
    Backwardation,
}

impl MarketStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStructure::Contango => "CONTANGO",
            MarketStructure::Backwardation => "BACKWARDATION",
        }
    }
}

impl std::fmt::Display for MarketStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contango when `far >= near`, backwardation otherwise
pub fn classify_market_structure(near: Decimal, far: Decimal) -> MarketStructure {
    if far >= near {
        MarketStructure::Contango
    } else {
        MarketStructure::Backwardation
    }
}

/// Absolute difference between two prices
pub fn compute_spread(a: Decimal, b: Decimal) -> Decimal {
    (a - b).abs()
}

/// Percentage move from `from` to `to`; `None` when `from` is zero
pub fn percent_change(from: Decimal, to: Decimal) -> Option<Decimal> {
    if from.is_zero() {
        return None;
    }
    (to - from)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|d| d.checked_div(from))
}
