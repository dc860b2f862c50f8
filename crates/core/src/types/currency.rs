//! Currency codes and type-safe price representation using decimal arithmetic.
//!
//! [`CurrencyCode`] covers the display currencies the marketplace offers in
//! its currency picker. Source prices coming from the backend may carry any
//! ISO 4217 code and are kept as plain strings on [`Product`]; only the
//! user's *selected* display currency is constrained to this set.
//!
//! Formatting policy lives here so it stays pure and locale-stable:
//! - regional som/tenge currencies render with zero decimal places, two
//!   otherwise
//! - `$`, `£`, `€` and `¥` are prefixed, every other symbol is suffixed
//! - integer digits are grouped in threes with a space
//!
//! [`Product`]: crate::types::product::Product

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Display currencies offered by the marketplace.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    /// Uzbek som - the base currency all rates are quoted against.
    #[default]
    UZS,
    USD,
    EUR,
    RUB,
    KZT,
    GBP,
    CNY,
    TRY,
    AED,
    KGS,
}

impl CurrencyCode {
    /// All display currencies, in picker order.
    pub const ALL: [Self; 10] = [
        Self::UZS,
        Self::USD,
        Self::EUR,
        Self::RUB,
        Self::KZT,
        Self::GBP,
        Self::CNY,
        Self::TRY,
        Self::AED,
        Self::KGS,
    ];

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::UZS => "UZS",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::RUB => "RUB",
            Self::KZT => "KZT",
            Self::GBP => "GBP",
            Self::CNY => "CNY",
            Self::TRY => "TRY",
            Self::AED => "AED",
            Self::KGS => "KGS",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::UZS => "so'm",
            Self::USD => "$",
            Self::EUR => "€",
            Self::RUB => "₽",
            Self::KZT => "₸",
            Self::GBP => "£",
            Self::CNY => "¥",
            Self::TRY => "₺",
            Self::AED => "د.إ",
            Self::KGS => "с",
        }
    }

    /// Number of decimal places shown for this currency.
    ///
    /// The regional som/tenge currencies are never shown with fractional
    /// digits; everything else gets two.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::UZS | Self::KZT | Self::KGS => 0,
            _ => 2,
        }
    }

    /// Whether the symbol is written before the amount (`$100`) rather than
    /// after it (`100 so'm`).
    #[must_use]
    pub const fn symbol_is_prefix(self) -> bool {
        matches!(self, Self::USD | Self::EUR | Self::GBP | Self::CNY)
    }
}

impl std::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Error parsing a currency code string.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown currency code: {0}")]
pub struct ParseCurrencyError(pub String);

impl std::str::FromStr for CurrencyCode {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| ParseCurrencyError(s.to_string()))
    }
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// Display currency code.
    pub currency: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency: CurrencyCode) -> Self {
        Self { amount, currency }
    }

    /// Format for display (e.g., `$19.99` or `12 000 so'm`).
    #[must_use]
    pub fn display(&self) -> String {
        let digits = format_grouped(self.amount, self.currency.decimal_places());
        if self.currency.symbol_is_prefix() {
            format!("{}{digits}", self.currency.symbol())
        } else {
            format!("{digits} {}", self.currency.symbol())
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Round to `decimals` places and group integer digits in threes with a
/// space, the way prices are rendered throughout the marketplace.
#[must_use]
pub fn format_grouped(amount: Decimal, decimals: u32) -> String {
    let rendered = format!("{:.*}", decimals as usize, amount.round_dp(decimals));
    let (number, negative) = rendered
        .strip_prefix('-')
        .map_or((rendered.as_str(), false), |rest| (rest, true));
    let (int_part, frac_part) = match number.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (number, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 4);
    let digits: Vec<char> = int_part.chars().collect();
    for (i, ch) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(*ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}
