//! View-models computed on read from feed states

use super::quote::{
    cash_settlement, lme_landed_price, mcx_landed_price, CashSettlement, QuoteOutOfRange, RateBasis,
};
use super::structure::{classify_market_structure, compute_spread, percent_change, MarketStructure};
use crate::error::ErrorKind;
use crate::scheduler::{ConnectionMode, FeedState};
use chrono::{DateTime, Utc};
use futures_util::future::select_all;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tokio::sync::watch;

/// Dashboard slot a feed fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedRole {
    LmeSpot,
    LmeThreeMonth,
    McxNear,
    McxNext,
    Rbi,
    SbiTt,
}

impl FeedRole {
    pub const ALL: [FeedRole; 6] = [
        FeedRole::LmeSpot,
        FeedRole::LmeThreeMonth,
        FeedRole::McxNear,
        FeedRole::McxNext,
        FeedRole::Rbi,
        FeedRole::SbiTt,
    ];

    /// Identifier used in config sections and snapshots
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedRole::LmeSpot => "lme_spot",
            FeedRole::LmeThreeMonth => "lme_3m",
            FeedRole::McxNear => "mcx_near",
            FeedRole::McxNext => "mcx_next",
            FeedRole::Rbi => "rbi",
            FeedRole::SbiTt => "sbi_tt",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.as_str() == id)
    }
}

impl std::fmt::Display for FeedRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One displayed price with its freshness
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    pub value: Decimal,
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
    pub mode: ConnectionMode,
    /// Last refresh failed; the value is the last good one
    pub stale: bool,
    pub last_error: Option<ErrorKind>,
}

impl PricePoint {
    /// `None` until the feed has produced a value
    pub fn from_state(state: &FeedState) -> Option<Self> {
        let snapshot = state.snapshot.as_ref()?;
        let change_percent = snapshot.change_percent.or_else(|| {
            snapshot
                .change
                .and_then(|c| percent_change(snapshot.value - c, snapshot.value))
        });

        Some(Self {
            value: snapshot.value,
            change: snapshot.change,
            change_percent,
            timestamp: snapshot.timestamp,
            mode: state.mode,
            stale: state.is_stale(),
            last_error: state.last_error,
        })
    }
}

/// Near and far leg of a curve with derived spread and structure
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurveView {
    pub near: Option<PricePoint>,
    pub far: Option<PricePoint>,
    pub spread: Option<Decimal>,
    pub structure: Option<MarketStructure>,
}

impl CurveView {
    pub fn new(near: &FeedState, far: &FeedState) -> Self {
        let near = PricePoint::from_state(near);
        let far = PricePoint::from_state(far);

        let (spread, structure) = match (&near, &far) {
            (Some(n), Some(f)) => (
                Some(compute_spread(n.value, f.value)),
                Some(classify_market_structure(n.value, f.value)),
            ),
            _ => (None, None),
        };

        Self {
            near,
            far,
            spread,
            structure,
        }
    }

    /// Far minus near, signed
    pub fn signed_spread(&self) -> Option<Decimal> {
        Some(self.far.as_ref()?.value - self.near.as_ref()?.value)
    }

    /// Settlement of the near leg against the curve spread
    pub fn settlement(&self, rate: Decimal) -> Option<CashSettlement> {
        let near = self.near.as_ref()?;
        cash_settlement(near.value, self.signed_spread()?, rate)
    }
}

/// Exchange rates on display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatesView {
    pub rbi: Option<PricePoint>,
    pub sbi_tt: Option<PricePoint>,
}

impl RatesView {
    pub fn new(rbi: &FeedState, sbi_tt: &FeedState) -> Self {
        Self {
            rbi: PricePoint::from_state(rbi),
            sbi_tt: PricePoint::from_state(sbi_tt),
        }
    }

    pub fn rate(&self, basis: RateBasis) -> Option<Decimal> {
        let point = match basis {
            RateBasis::Rbi => &self.rbi,
            RateBasis::SbiTt => &self.sbi_tt,
        };
        point.as_ref().map(|p| p.value)
    }
}

/// Landed prices for one premium/freight/rate choice
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LandedQuote {
    pub basis: RateBasis,
    pub rate: Option<Decimal>,
    pub mcx: Option<Decimal>,
    pub lme: Option<Decimal>,
}

/// Everything the dashboard shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Spot against 3-month
    pub lme: CurveView,
    /// Near month against next month
    pub mcx: CurveView,
    pub rates: RatesView,
    pub generated_at: DateTime<Utc>,
}

impl DashboardView {
    /// Landed cost of the near MCX month and the LME 3-month price
    ///
    /// A leg is `None` when its inputs are missing. Fails when a held price
    /// combined with `premium` or `freight` does not fit in a `Decimal`.
    pub fn quote(
        &self,
        basis: RateBasis,
        premium: Decimal,
        freight: Decimal,
    ) -> Result<LandedQuote, QuoteOutOfRange> {
        let rate = self.rates.rate(basis);
        let mcx = match self.mcx.near.as_ref() {
            Some(p) => Some(mcx_landed_price(p.value, premium, freight).ok_or(QuoteOutOfRange)?),
            None => None,
        };
        let lme = match (self.lme.far.as_ref(), rate) {
            (Some(p), Some(r)) => {
                Some(lme_landed_price(p.value, premium, freight, r).ok_or(QuoteOutOfRange)?)
            }
            _ => None,
        };

        Ok(LandedQuote {
            basis,
            rate,
            mcx,
            lme,
        })
    }
}

/// Reads the published states of several schedulers
#[derive(Debug, Clone, Default)]
pub struct PriceAggregator {
    inputs: BTreeMap<FeedRole, watch::Receiver<FeedState>>,
}

impl PriceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, role: FeedRole, rx: watch::Receiver<FeedState>) {
        self.inputs.insert(role, rx);
    }

    pub fn roles(&self) -> impl Iterator<Item = FeedRole> + '_ {
        self.inputs.keys().copied()
    }

    /// Current state of a slot; empty when nothing feeds it
    pub fn state(&self, role: FeedRole) -> FeedState {
        self.inputs
            .get(&role)
            .map(|rx| rx.borrow().clone())
            .unwrap_or_default()
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            lme: CurveView::new(
                &self.state(FeedRole::LmeSpot),
                &self.state(FeedRole::LmeThreeMonth),
            ),
            mcx: CurveView::new(&self.state(FeedRole::McxNear), &self.state(FeedRole::McxNext)),
            rates: RatesView::new(&self.state(FeedRole::Rbi), &self.state(FeedRole::SbiTt)),
            generated_at: Utc::now(),
        }
    }

    /// Wait until any input changes; `false` when there are no live inputs
    pub async fn changed(&mut self) -> bool {
        if self.inputs.is_empty() {
            return false;
        }
        let waits = self.inputs.values_mut().map(|rx| Box::pin(rx.changed()));
        let (result, _, _) = select_all(waits).await;
        result.is_ok()
    }
}
