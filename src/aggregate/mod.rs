//! Price aggregation
//!
//! Pure derived metrics (spread, market structure, percent change, landed
//! quotes) and the view-models built from several feed states on read.
//! Nothing here is stored; identical inputs give identical outputs.

mod quote;
mod structure;
mod views;

pub use quote::{
    cash_settlement, lme_landed_price, mcx_landed_price, CashSettlement, QuoteOutOfRange,
    RateBasis, LME_DUTY_FACTOR,
};
pub use structure::{classify_market_structure, compute_spread, percent_change, MarketStructure};
pub use views::{
    CurveView, DashboardView, FeedRole, LandedQuote, PriceAggregator, PricePoint, RatesView,
};
