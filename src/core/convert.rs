//! Conversion of amounts into the base currency, plus display formatting.

use anyhow::anyhow;
use std::fmt::Display;
use std::str::FromStr;

use crate::core::rates::{RateKind, RateMap};

/// A validated, non-negative amount as typed by a user.
///
/// Partial input such as `""`, `"."` or `"12."` is accepted (empty input is
/// zero); anything else than optional digits, an optional single decimal point
/// and optional digits is refused.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    pub fn parse(text: &str) -> Option<Amount> {
        if !is_amount_text(text) {
            return None;
        }
        if !text.chars().any(|c| c.is_ascii_digit()) {
            return Some(Amount::ZERO);
        }
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Amount)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl FromStr for Amount {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Amount::parse(s).ok_or_else(|| anyhow!("Invalid amount: {}", s))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input boundary check, equivalent to `^[0-9]*\.?[0-9]*$`.
pub fn is_amount_text(text: &str) -> bool {
    let mut seen_dot = false;
    text.chars().all(|c| match c {
        '0'..='9' => true,
        '.' if !seen_dot => {
            seen_dot = true;
            true
        }
        _ => false,
    })
}

/// Converts `amount` of `from` into base units.
///
/// Fiat rates are divisors (`amount / rate`), crypto rates multipliers
/// (`amount * rate`). A missing or zero rate yields `0`.
pub fn convert(amount: f64, from: &str, rates: &RateMap, mode: RateKind) -> f64 {
    let Some(rate) = rates.get(from).filter(|r| *r != 0.0) else {
        return 0.0;
    };
    match mode {
        RateKind::Fiat => amount / rate,
        RateKind::Crypto => amount * rate,
    }
}

/// Price of one unit of a currency or coin in base units.
pub fn unit_price(rate: f64, mode: RateKind) -> f64 {
    match mode {
        RateKind::Fiat if rate == 0.0 => 0.0,
        RateKind::Fiat => 1.0 / rate,
        RateKind::Crypto => rate,
    }
}

/// Two fixed decimals, e.g. `0.01`.
pub fn format_amount(value: f64) -> String {
    format!("{value:.2}")
}

/// Thousands separators and at most two decimals, e.g. `67,500,000` or
/// `1,234.5`.
pub fn format_grouped(value: f64) -> String {
    let rounded = format!("{:.2}", value.abs());
    let (int_part, frac_part) = rounded
        .split_once('.')
        .unwrap_or((rounded.as_str(), ""));
    let frac_part = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.is_empty();
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

/// Formats a value for display according to the convention of its kind.
pub fn format_for_kind(value: f64, mode: RateKind) -> String {
    match mode {
        RateKind::Fiat => format_amount(value),
        RateKind::Crypto => format_grouped(value),
    }
}
