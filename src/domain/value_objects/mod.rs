//! Value Objects for the commerce core

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

const DECIMAL_PLACES: u32 = 2;

/// Upper bound accepted for a wholesale markup.
pub const MAX_MARKUP_PERCENT: f64 = 1000.0;

/// Minimum length of a user id accepted by the cart endpoints.
pub const MIN_USER_ID_LEN: usize = 5;

/// Money value object
///
/// Amounts travel as `f64` on the wire and in storage; arithmetic happens in
/// `Decimal` and every result leaves rounded to 2 places, half away from zero.
/// Every operation is checked: amounts `Decimal` cannot hold are rejected,
/// never clamped or zeroed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn from_f64(value: f64) -> Result<Self, MoneyError> {
        if !value.is_finite() {
            return Err(MoneyError::Unrepresentable(value));
        }
        Decimal::from_f64(value).map(Self).ok_or(MoneyError::Unrepresentable(value))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn add(&self, other: Money) -> Result<Money, MoneyError> {
        self.0.checked_add(other.0).map(Money).ok_or(MoneyError::Overflow)
    }

    pub fn multiply(&self, qty: u32) -> Result<Money, MoneyError> {
        self.0.checked_mul(Decimal::from(qty)).map(Money).ok_or(MoneyError::Overflow)
    }

    /// `self * (1 + percent/100)`, rounded to cents.
    pub fn marked_up(&self, markup: MarkupPercent) -> Result<Money, MoneyError> {
        let factor = Decimal::ONE + markup.0 / Decimal::ONE_HUNDRED;
        self.0
            .checked_mul(factor)
            .map(|m| Money(m).rounded())
            .ok_or(MoneyError::Overflow)
    }

    pub fn rounded(&self) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    pub fn to_f64(&self) -> f64 {
        self.rounded().0.to_f64().unwrap_or_default()
    }

    /// Equal to the cent.
    pub fn approx_eq(&self, other: Money) -> bool {
        self.rounded() == other.rounded()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoneyError {
    Unrepresentable(f64),
    Overflow,
}
impl std::error::Error for MoneyError {}
impl fmt::Display for MoneyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrepresentable(v) => write!(f, "amount {v} is out of range"),
            Self::Overflow => write!(f, "amount is out of range"),
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded().0)
    }
}

/// Markup percentage applied to a wholesaler's unit price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MarkupPercent(Decimal);

impl MarkupPercent {
    pub const DEFAULT: f64 = 20.0;

    pub fn new(percent: f64) -> Result<Self, MarkupError> {
        if !percent.is_finite() {
            return Err(MarkupError::NotFinite);
        }
        if !(0.0..=MAX_MARKUP_PERCENT).contains(&percent) {
            return Err(MarkupError::OutOfRange(percent));
        }
        Ok(Self(Decimal::from_f64(percent).unwrap_or_default()))
    }
}

impl Default for MarkupPercent {
    fn default() -> Self {
        Self(Decimal::from(20))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MarkupError {
    NotFinite,
    OutOfRange(f64),
}
impl std::error::Error for MarkupError {}
impl fmt::Display for MarkupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFinite => write!(f, "markup_percent must be a finite number"),
            Self::OutOfRange(p) => write!(
                f,
                "markup_percent must be between 0 and {MAX_MARKUP_PERCENT}, got {p}"
            ),
        }
    }
}

/// User id as accepted by the cart endpoints
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn parse(value: impl Into<String>) -> Result<Self, UserIdError> {
        let value = value.into().trim().to_string();
        if value.len() < MIN_USER_ID_LEN {
            return Err(UserIdError);
        }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct UserIdError;
impl std::error::Error for UserIdError {}
impl fmt::Display for UserIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid user ID format")
    }
}

/// A JSON number, or a string holding one.
///
/// Catalog writes accept both shapes and always store the numeric value.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Default for Numeric {
    fn default() -> Self {
        Numeric::Number(0.0)
    }
}

impl Numeric {
    pub fn to_f64(&self, field: &str) -> Result<f64, NumericError> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| NumericError::new(field, "is not a number"))?,
        };
        if !value.is_finite() {
            return Err(NumericError::new(field, "must be finite"));
        }
        Ok(value)
    }

    pub fn to_i64(&self, field: &str) -> Result<i64, NumericError> {
        let value = self.to_f64(field)?;
        if value.fract() != 0.0 {
            return Err(NumericError::new(field, "must be a whole number"));
        }
        Ok(value as i64)
    }
}

#[derive(Debug, Clone)]
pub struct NumericError {
    field: String,
    reason: &'static str,
}

impl NumericError {
    fn new(field: &str, reason: &'static str) -> Self {
        Self { field: field.to_string(), reason }
    }
}
impl std::error::Error for NumericError {}
impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_line_total() {
        let price = Money::from_f64(19.99).unwrap();
        assert_eq!(price.multiply(3).unwrap().to_f64(), 59.97);
    }

    #[test]
    fn test_money_sum_has_no_float_drift() {
        let dime = Money::from_f64(0.1).unwrap();
        let total = (0..10).fold(Money::ZERO, |acc, _| acc.add(dime).unwrap());
        assert_eq!(total.to_f64(), 1.0);
    }

    #[test]
    fn test_markup_rounds_half_away_from_zero() {
        let markup = MarkupPercent::new(15.0).unwrap();
        // 10.01 * 1.15 = 11.5115
        assert_eq!(Money::from_f64(10.01).unwrap().marked_up(markup).unwrap().to_f64(), 11.51);
        // 0.05 * 1.10 = 0.055
        let ten = MarkupPercent::new(10.0).unwrap();
        assert_eq!(Money::from_f64(0.05).unwrap().marked_up(ten).unwrap().to_f64(), 0.06);
    }

    #[test]
    fn test_markup_default_is_twenty_percent() {
        assert_eq!(
            Money::from_f64(50.0).unwrap().marked_up(MarkupPercent::default()).unwrap().to_f64(),
            60.0
        );
    }

    #[test]
    fn test_money_rejects_out_of_range() {
        assert_eq!(Money::from_f64(1e30), Err(MoneyError::Unrepresentable(1e30)));
        assert!(Money::from_f64(f64::INFINITY).is_err());

        let huge = Money::from_f64(1e20).unwrap();
        assert_eq!(huge.multiply(1_000_000_000), Err(MoneyError::Overflow));
        let max = Money::from_f64(7e28).unwrap();
        assert_eq!(max.add(max), Err(MoneyError::Overflow));
        assert_eq!(max.marked_up(MarkupPercent::default()), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_markup_rejects_negative() {
        assert_eq!(MarkupPercent::new(-5.0), Err(MarkupError::OutOfRange(-5.0)));
        assert!(MarkupPercent::new(f64::NAN).is_err());
    }

    #[test]
    fn test_user_id() {
        assert_eq!(UserId::parse(" user-1 ").unwrap().as_str(), "user-1");
        assert!(UserId::parse("abc").is_err());
    }

    #[test]
    fn test_numeric_accepts_strings() {
        assert_eq!(Numeric::Text("70.0".into()).to_f64("price").unwrap(), 70.0);
        assert_eq!(Numeric::Text("500".into()).to_i64("stock").unwrap(), 500);
        assert_eq!(Numeric::Number(500.0).to_i64("stock").unwrap(), 500);
        assert!(Numeric::Text("ten".into()).to_f64("price").is_err());
        assert!(Numeric::Number(1.5).to_i64("stock").is_err());
    }
}
