//! Upstream payload shapes
//!
//! Every feed payload is decoded exactly once here into typed structs.
//! Scraper services send prices as numbers or as currency-prefixed strings,
//! sometimes wrapped in a `{success, data}` envelope, so those variations are
//! modelled as untagged enums rather than passed inward as raw JSON.

use super::types::{ContractMonth, FeedKind, PriceSnapshot, RateField};
use crate::error::FeedError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::LazyLock;

/// Leading signed number, e.g. the `-39.25` in `-39.25 ((-1.60%))`
static CHANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?\d[\d,]*(?:\.\d+)?)(?:\s|\(|$)").expect("valid change pattern")
});

/// Signed number directly before a percent sign
static PERCENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([+-]?\d[\d,]*(?:\.\d+)?)\s*%").expect("valid percent pattern")
});

/// A price that may arrive as a JSON number or as text
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(serde_json::Number),
    Text(String),
}

impl NumberOrText {
    fn to_decimal(&self) -> Result<Decimal, FeedError> {
        match self {
            NumberOrText::Number(n) => {
                let s = n.to_string();
                Decimal::from_str(&s)
                    .or_else(|_| Decimal::from_scientific(&s))
                    .map_err(|e| FeedError::parse(format!("invalid number {}: {}", s, e)))
            }
            NumberOrText::Text(s) => parse_currency_value(s),
        }
    }
}

/// Optional `{success, data}` wrapping added by the proxy routes
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
    Failed { error: String },
}

/// `{"heartbeat": true}` keep-alive on push streams
#[derive(Debug, Deserialize)]
struct Heartbeat {
    heartbeat: bool,
}

/// Spot feed payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SpotPayload {
    #[serde(alias = "spot_price")]
    spot_price: NumberOrText,
    #[serde(default, alias = "price_change")]
    change: Option<NumberOrText>,
    #[serde(default, alias = "change_percentage")]
    change_percent: Option<NumberOrText>,
    #[serde(default, alias = "last_updated")]
    last_updated: Option<String>,
}

/// 3-month futures payload
#[derive(Debug, Deserialize)]
struct ThreeMonthPayload {
    #[serde(rename = "Value")]
    value: NumberOrText,
    #[serde(rename = "Rate of Change", default)]
    rate_of_change: Option<String>,
    #[serde(rename = "Timestamp", default)]
    timestamp: Option<String>,
}

/// Multi-month contract payload (MCX)
#[derive(Debug, Deserialize)]
struct ContractPayload {
    #[serde(default)]
    timestamp: Option<String>,
    prices: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct MonthQuote {
    price: NumberOrText,
    #[serde(default, alias = "rate_change")]
    site_rate_change: Option<String>,
}

/// One row of an exchange-rate table
#[derive(Debug, Deserialize)]
struct RateRow {
    #[serde(default)]
    date: Option<String>,
    #[serde(default, alias = "rbi_reference_rate")]
    rate: Option<NumberOrText>,
    #[serde(default)]
    sbi_tt_sell: Option<NumberOrText>,
}

/// Decode a polled payload for a feed of the given kind
pub fn decode_poll(kind: &FeedKind, source_id: &str, body: &str) -> Result<PriceSnapshot, FeedError> {
    match kind {
        FeedKind::Spot => {
            let p: SpotPayload = unwrap_envelope(body)?;
            let change = p.change.as_ref().map(NumberOrText::to_decimal).transpose()?;
            let change_percent = p
                .change_percent
                .as_ref()
                .map(NumberOrText::to_decimal)
                .transpose()?;
            Ok(PriceSnapshot::new(source_id, p.spot_price.to_decimal()?)
                .with_change(change, change_percent)
                .with_source_timestamp(p.last_updated.as_deref().and_then(parse_timestamp)))
        }
        FeedKind::ThreeMonth => {
            let p: ThreeMonthPayload = unwrap_envelope(body)?;
            let (change, change_percent) = p
                .rate_of_change
                .as_deref()
                .map(parse_rate_of_change)
                .unwrap_or((None, None));
            Ok(PriceSnapshot::new(source_id, p.value.to_decimal()?)
                .with_change(change, change_percent)
                .with_source_timestamp(p.timestamp.as_deref().and_then(parse_timestamp)))
        }
        FeedKind::ContractMonth { month } => {
            let p: ContractPayload = unwrap_envelope(body)?;
            let (label, raw) = select_month(&p.prices, month)?;
            let quote: MonthQuote = serde_json::from_value(raw.clone())
                .map_err(|e| FeedError::parse(format!("contract {}: {}", label, e)))?;
            let (change, change_percent) = quote
                .site_rate_change
                .as_deref()
                .map(parse_rate_of_change)
                .unwrap_or((None, None));
            Ok(PriceSnapshot::new(source_id, quote.price.to_decimal()?)
                .with_change(change, change_percent)
                .with_source_timestamp(p.timestamp.as_deref().and_then(parse_timestamp)))
        }
        FeedKind::ExchangeRate { field } => {
            let rows: Vec<RateRow> = unwrap_envelope(body)?;
            let row = rows
                .into_iter()
                .next()
                .ok_or_else(|| FeedError::parse("empty rate table"))?;
            let raw = match field {
                RateField::Rate => row.rate,
                RateField::SbiTtSell => row.sbi_tt_sell,
            }
            .ok_or_else(|| FeedError::parse(format!("rate row missing {:?} field", field)))?;
            Ok(PriceSnapshot::new(source_id, raw.to_decimal()?)
                .with_source_timestamp(row.date.as_deref().and_then(parse_timestamp)))
        }
    }
}

/// Decode one push-stream message; `Ok(None)` for keep-alives
pub fn decode_push(
    kind: &FeedKind,
    source_id: &str,
    data: &str,
) -> Result<Option<PriceSnapshot>, FeedError> {
    if serde_json::from_str::<Heartbeat>(data).is_ok_and(|h| h.heartbeat) {
        return Ok(None);
    }
    decode_poll(kind, source_id, data).map(Some)
}

fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<T, FeedError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(Envelope::Wrapped { data }) | Ok(Envelope::Bare(data)) => Ok(data),
        Ok(Envelope::Failed { error }) => Err(FeedError::Upstream(error)),
        // Re-decode as the bare shape to report which field was wrong
        Err(_) => Err(serde_json::from_str::<T>(body)
            .err()
            .map(FeedError::from)
            .unwrap_or_else(|| FeedError::parse("unrecognised payload"))),
    }
}

fn select_month<'a>(
    prices: &'a serde_json::Map<String, serde_json::Value>,
    month: &ContractMonth,
) -> Result<(&'a str, &'a serde_json::Value), FeedError> {
    let found = match month {
        ContractMonth::Position(i) => prices.iter().nth(*i),
        ContractMonth::Label(label) => prices.iter().find(|(k, _)| k.as_str() == label.as_str()),
    };
    found
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| FeedError::parse(format!("contract month {:?} not in payload", month)))
}

/// Parse a price string such as `"US$ 2,639.50"` or `"₹84.47"`
pub fn parse_currency_value(raw: &str) -> Result<Decimal, FeedError> {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    if !cleaned.chars().any(|c| c.is_ascii_digit()) {
        return Err(FeedError::parse(format!("no numeric value in {:?}", raw)));
    }

    Decimal::from_str(&cleaned).map_err(|e| FeedError::parse(format!("invalid value {:?}: {}", raw, e)))
}

/// Split a rate-of-change string like `"-39.25 ((-1.60%))"` into
/// `(change, change_percent)`. Parts that are absent come back as `None`.
pub fn parse_rate_of_change(raw: &str) -> (Option<Decimal>, Option<Decimal>) {
    let number = |m: regex::Match<'_>| Decimal::from_str(&m.as_str().replace(',', "")).ok();

    let change = CHANGE_PATTERN
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(number);
    let percent = PERCENT_PATTERN
        .captures(raw)
        .and_then(|c| c.get(1))
        .and_then(number);

    (change, percent)
}

/// Parse an upstream timestamp: RFC 3339, `YYYY-MM-DD HH:MM:SS` or a bare
/// date (taken as midnight UTC)
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }

    for fmt in ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y", "%d %b %Y", "%d %B %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| n.and_utc());
        }
    }

    None
}
