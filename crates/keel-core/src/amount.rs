//! Currency-scoped monetary amounts with exact decimal arithmetic.
//!
//! Minimal-unit multipliers reach 10^18 (wei), so every conversion uses
//! [`Decimal`] — never binary floating point.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::currency::CurrencyInfo;
use crate::error::AmountError;

/// `<decimal> [<unit symbol>]?` — the accepted amount grammar.
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(\.\d+)?) ?([A-Za-z]+)?$").expect("valid amount pattern"));

/// An immutable monetary value scoped to one currency.
///
/// The value is stored in base units (whole coins). Arithmetic and
/// comparisons are only defined between amounts of the same currency and
/// fail with [`AmountError::CurrencyMismatch`] otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    currency: CurrencyInfo,
    base: Decimal,
}

impl Amount {
    /// Create an amount from a base-unit value.
    pub fn new(currency: CurrencyInfo, base: Decimal) -> Self {
        Self { currency, base }
    }

    /// Create an amount from a minimal-unit value (satoshis, wei, ...).
    pub fn from_minimal(currency: CurrencyInfo, minimal: Decimal) -> Self {
        let base = minimal / pow10(currency.decimals);
        Self { currency, base }
    }

    /// Parse `<decimal> [<unit symbol>]?`.
    ///
    /// Without a unit symbol the value is taken in base units. With one,
    /// the symbol must match the currency's base symbol or name, or its
    /// minimal-unit symbol, case-insensitively and with a trailing `s`
    /// plural stripped. Anything else is [`AmountError::CannotParse`].
    pub fn parse(currency: CurrencyInfo, input: &str) -> Result<Self, AmountError> {
        let caps = AMOUNT_RE
            .captures(input.trim())
            .ok_or_else(|| AmountError::CannotParse(input.to_string()))?;

        let value = Decimal::from_str(&caps[1])
            .map_err(|_| AmountError::CannotParse(input.to_string()))?;

        let Some(unit) = caps.get(3) else {
            return Ok(Self::new(currency, value));
        };

        let mut unit = unit.as_str().to_lowercase();
        if unit.ends_with('s') {
            unit.pop();
        }

        if unit == currency.symbol.to_lowercase() || unit == currency.name.to_lowercase() {
            Ok(Self::new(currency, value))
        } else if unit == currency.minimal_unit_symbol.to_lowercase() {
            Ok(Self::from_minimal(currency, value))
        } else {
            Err(AmountError::CannotParse(input.to_string()))
        }
    }

    /// The currency this amount belongs to.
    pub fn currency(&self) -> &CurrencyInfo {
        &self.currency
    }

    /// Value in base units.
    pub fn base_units(&self) -> Decimal {
        self.base
    }

    /// Value in minimal units, exact (`base × 10^decimals`).
    pub fn minimal_units(&self) -> Decimal {
        self.base * pow10(self.currency.decimals)
    }

    /// Value as a whole number of minimal units.
    ///
    /// Fails if the amount is negative or does not land on a whole
    /// minimal unit — chains cannot move fractional satoshis or wei.
    pub fn minimal_integer(&self) -> Result<u128, AmountError> {
        let minimal = self.minimal_units();
        if minimal.is_sign_negative() || !minimal.fract().is_zero() {
            return Err(AmountError::NotRepresentable(minimal.to_string()));
        }
        minimal
            .to_u128()
            .ok_or_else(|| AmountError::NotRepresentable(minimal.to_string()))
    }

    /// Sum of two amounts of the same currency.
    pub fn checked_add(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.require_same_currency(other)?;
        Ok(Self::new(self.currency.clone(), self.base + other.base))
    }

    /// Difference of two amounts of the same currency.
    pub fn checked_sub(&self, other: &Amount) -> Result<Amount, AmountError> {
        self.require_same_currency(other)?;
        Ok(Self::new(self.currency.clone(), self.base - other.base))
    }

    /// Ordering between two amounts of the same currency.
    pub fn compare(&self, other: &Amount) -> Result<Ordering, AmountError> {
        self.require_same_currency(other)?;
        Ok(self.base.cmp(&other.base))
    }

    fn require_same_currency(&self, other: &Amount) -> Result<(), AmountError> {
        if self.currency.same_currency(&other.currency) {
            Ok(())
        } else {
            Err(AmountError::CurrencyMismatch {
                left: self.currency.symbol.clone(),
                right: other.currency.symbol.clone(),
            })
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.base, self.currency.symbol)
    }
}

/// Exact `10^decimals` as a decimal. Callers keep `decimals` within the
/// documented ≤ 28 bound of [`CurrencyInfo`].
fn pow10(decimals: u32) -> Decimal {
    Decimal::from_i128_with_scale(10i128.pow(decimals), 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn btc() -> CurrencyInfo {
        CurrencyInfo {
            id: "bitcoin".into(),
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            minimal_unit_symbol: "satoshi".into(),
            decimals: 8,
            default_derivation_path: "m/84'/0'/0'/0/0".into(),
        }
    }

    fn eth() -> CurrencyInfo {
        CurrencyInfo {
            id: "ethereum".into(),
            name: "Ethereum".into(),
            symbol: "ETH".into(),
            minimal_unit_symbol: "wei".into(),
            decimals: 18,
            default_derivation_path: "m/44'/60'/0'/0/0".into(),
        }
    }

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn parse_bare_number_is_base_units() {
        let a = Amount::parse(btc(), "1.5").unwrap();
        assert_eq!(a.base_units(), dec("1.5"));
    }

    #[test]
    fn parse_base_symbol_case_insensitive() {
        let a = Amount::parse(btc(), "2 btc").unwrap();
        assert_eq!(a.base_units(), dec("2"));
        let b = Amount::parse(btc(), "2 BTC").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_currency_name() {
        let a = Amount::parse(btc(), "0.25 bitcoin").unwrap();
        assert_eq!(a.base_units(), dec("0.25"));
    }

    #[test]
    fn parse_minimal_unit_divides() {
        let a = Amount::parse(btc(), "100000000 satoshi").unwrap();
        assert_eq!(a.base_units(), dec("1"));
    }

    #[test]
    fn parse_plural_minimal_unit() {
        let a = Amount::parse(btc(), "50000000 satoshis").unwrap();
        assert_eq!(a.base_units(), dec("0.5"));
    }

    #[test]
    fn parse_unknown_symbol_fails() {
        let err = Amount::parse(btc(), "1 doge").unwrap_err();
        assert!(matches!(err, AmountError::CannotParse(_)));
    }

    #[test]
    fn parse_garbage_fails() {
        for input in ["", "abc", "1.2.3", "-5", "1 BTC extra"] {
            let err = Amount::parse(btc(), input).unwrap_err();
            assert!(matches!(err, AmountError::CannotParse(_)), "input: {input}");
        }
    }

    #[test]
    fn parse_format_roundtrip() {
        let a = Amount::parse(btc(), "1.23456789 BTC").unwrap();
        let b = Amount::parse(btc(), &a.to_string()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn minimal_units_exact_at_18_decimals() {
        let a = Amount::parse(eth(), "1.000000000000000001 ETH").unwrap();
        assert_eq!(a.minimal_units(), dec("1000000000000000001"));
        assert_eq!(a.minimal_integer().unwrap(), 1_000_000_000_000_000_001u128);
    }

    #[test]
    fn wei_parse_is_exact() {
        let a = Amount::parse(eth(), "1000000000000000001 wei").unwrap();
        assert_eq!(a.base_units(), dec("1.000000000000000001"));
    }

    #[test]
    fn minimal_integer_rejects_fractional() {
        let a = Amount::parse(btc(), "0.000000001").unwrap(); // 0.1 satoshi
        assert!(matches!(
            a.minimal_integer(),
            Err(AmountError::NotRepresentable(_))
        ));
    }

    #[test]
    fn arithmetic_same_currency() {
        let a = Amount::parse(btc(), "1.5").unwrap();
        let b = Amount::parse(btc(), "0.5").unwrap();
        assert_eq!(a.checked_add(&b).unwrap().base_units(), dec("2"));
        assert_eq!(a.checked_sub(&b).unwrap().base_units(), dec("1"));
        assert_eq!(a.compare(&b).unwrap(), Ordering::Greater);
    }

    #[test]
    fn arithmetic_cross_currency_fails() {
        let a = Amount::parse(btc(), "1").unwrap();
        let b = Amount::parse(eth(), "1").unwrap();
        assert!(matches!(
            a.checked_add(&b),
            Err(AmountError::CurrencyMismatch { .. })
        ));
        assert!(matches!(
            a.compare(&b),
            Err(AmountError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn from_minimal_roundtrip() {
        let a = Amount::from_minimal(btc(), dec("123456789"));
        assert_eq!(a.base_units(), dec("1.23456789"));
        assert_eq!(a.minimal_integer().unwrap(), 123_456_789);
    }
}
