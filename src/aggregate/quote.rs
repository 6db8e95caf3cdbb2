//! Landed-cost quotes and cash settlement

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Import duty multiplier applied to LME prices
pub const LME_DUTY_FACTOR: Decimal = dec!(1.0825);

/// Exchange rate used to convert USD quotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateBasis {
    /// RBI reference rate
    #[default]
    Rbi,
    /// SBI TT selling rate
    SbiTt,
}

impl std::str::FromStr for RateBasis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rbi" => Ok(RateBasis::Rbi),
            "sbi" | "sbi_tt" | "sbitt" => Ok(RateBasis::SbiTt),
            other => Err(format!("unknown rate basis: {}", other)),
        }
    }
}

/// Inputs too large for a landed-cost calculation
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("Premium or freight is out of range")]
pub struct QuoteOutOfRange;

/// MCX landed price in INR/kg; `None` on overflow
pub fn mcx_landed_price(price: Decimal, premium: Decimal, freight: Decimal) -> Option<Decimal> {
    price.checked_add(premium)?.checked_add(freight)
}

/// LME landed price in INR/kg from a USD/t price
///
/// `((price + premium) * duty * rate) / 1000 + freight`, `None` on overflow
pub fn lme_landed_price(
    price: Decimal,
    premium: Decimal,
    freight: Decimal,
    rate: Decimal,
) -> Option<Decimal> {
    price
        .checked_add(premium)?
        .checked_mul(LME_DUTY_FACTOR)?
        .checked_mul(rate)?
        .checked_div(dec!(1000))?
        .checked_add(freight)
}

/// Cash settlement derived from a base price and the cash spread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CashSettlement {
    pub total: Decimal,
    pub spread: Decimal,
    /// `None` when the base is zero
    pub percent: Option<Decimal>,
    /// `|spread| * rate`
    pub spread_inr: Decimal,
    /// Spread is zero or positive
    pub is_increase: bool,
}

/// `None` when the total or the INR spread overflows
pub fn cash_settlement(base: Decimal, spread: Decimal, rate: Decimal) -> Option<CashSettlement> {
    let percent = if base.is_zero() {
        None
    } else {
        spread
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|d| d.checked_div(base))
    };

    Some(CashSettlement {
        total: base.checked_add(spread)?,
        spread,
        percent,
        spread_inr: spread.abs().checked_mul(rate)?,
        is_increase: spread >= Decimal::ZERO,
    })
}
