//! Text rendering for the terminal views

use crate::aggregate::{CurveView, DashboardView, LandedQuote, PricePoint, RatesView};
use crate::scheduler::ConnectionMode;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt::Write;

/// Two decimal places with thousands separators, e.g. `2,639.50`
pub fn format_amount(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Signed change with optional percent, e.g. `-39.25 (-1.60%)`
///
/// Unknown parts render as `n/a` rather than zero.
pub fn format_change(change: Option<Decimal>, percent: Option<Decimal>) -> String {
    let signed = |v: Decimal| {
        if v.is_sign_negative() && !v.is_zero() {
            format_amount(v)
        } else {
            format!("+{}", format_amount(v))
        }
    };

    match (change, percent) {
        (Some(c), Some(p)) => format!("{} ({}%)", signed(c), signed(p)),
        (Some(c), None) => signed(c),
        (None, Some(p)) => format!("{}%", signed(p)),
        (None, None) => "n/a".to_string(),
    }
}

fn mode_label(mode: ConnectionMode) -> &'static str {
    match mode {
        ConnectionMode::Init => "connecting",
        ConnectionMode::Streaming => "live",
        ConnectionMode::Polling => "polling",
        ConnectionMode::Manual => "manual",
        ConnectionMode::Terminated => "stopped",
    }
}

/// One line for a price, flagged when stale
pub fn format_point(label: &str, symbol: &str, point: Option<&PricePoint>) -> String {
    match point {
        None => format!("{:<14} --", label),
        Some(p) => {
            let stale = if p.stale { " [stale]" } else { "" };
            format!(
                "{:<14} {}{:>12}  {:<22} {}{}",
                label,
                symbol,
                format_amount(p.value),
                format_change(p.change, p.change_percent),
                mode_label(p.mode),
                stale
            )
        }
    }
}

fn write_curve(out: &mut String, title: &str, symbol: &str, names: (&str, &str), curve: &CurveView) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "  {}", format_point(names.0, symbol, curve.near.as_ref()));
    let _ = writeln!(out, "  {}", format_point(names.1, symbol, curve.far.as_ref()));
    if let (Some(spread), Some(structure)) = (curve.spread, curve.structure) {
        let _ = writeln!(out, "  {:<14} {} {}{}", "structure", structure, symbol, format_amount(spread));
    }
}

fn write_rates(out: &mut String, rates: &RatesView) {
    let _ = writeln!(out, "Exchange rates");
    let _ = writeln!(out, "  {}", format_point("RBI", "₹", rates.rbi.as_ref()));
    let _ = writeln!(out, "  {}", format_point("SBI TT", "₹", rates.sbi_tt.as_ref()));
}

/// Full dashboard as plain text
pub fn render_dashboard(view: &DashboardView) -> String {
    let mut out = String::new();
    write_curve(&mut out, "LME Aluminium (USD/t)", "$", ("Spot", "3-Month"), &view.lme);
    write_curve(&mut out, "MCX Aluminium (INR/kg)", "₹", ("Near month", "Next month"), &view.mcx);
    write_rates(&mut out, &view.rates);
    let _ = writeln!(out, "as of {}", view.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    out
}

/// Landed-cost lines
pub fn render_quote(quote: &LandedQuote) -> String {
    let show = |v: Option<Decimal>| v.map(format_amount).unwrap_or_else(|| "--".to_string());
    format!(
        "Landed (INR/kg, {:?} rate {})\n  MCX  ₹{}\n  LME  ₹{}\n",
        quote.basis,
        quote.rate.map(|r| r.round_dp(4).to_string()).unwrap_or_else(|| "--".to_string()),
        show(quote.mcx),
        show(quote.lme),
    )
}
