//! Monetary primitives
//!
//! `Amount` is a strictly positive transfer value, `Balance` a non-negative
//! account balance. Both validate at construction time so invalid money
//! values cannot circulate through the transfer path.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Upper bound for any single value or balance (1 billion).
const MAX_VALUE: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

/// Maximum decimal places for a currency value.
const MAX_SCALE: u32 = 2;

/// A validated, strictly positive transfer value.
///
/// # Invariants
/// - value > 0
/// - at most 2 decimal places
/// - at most 1 billion
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("amount exceeds maximum allowed value ({MAX_VALUE})")]
    Overflow,

    #[error("balance would become negative")]
    NegativeBalance,

    #[error("invalid amount format: {0}")]
    Parse(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::TooManyDecimals` if more than 2 decimal places
    /// - `AmountError::Overflow` if value exceeds the cap
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        if value.scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(value.scale()));
        }

        if value > MAX_VALUE {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s).map_err(|e| AmountError::Parse(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::from_str(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        format!("{:.2}", amount.0)
    }
}

/// A non-negative account balance.
///
/// Unlike `Amount`, zero is a legal balance. `debited` refuses to go
/// negative; the transfer path re-runs that check on every commit attempt.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::NegativeBalance);
        }

        if value > MAX_VALUE {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Whether this balance covers the given value.
    pub fn covers(&self, amount: &Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Balance after receiving `amount`. Fails only on overflow of the cap.
    pub fn credited(&self, amount: &Amount) -> Result<Balance, AmountError> {
        Balance::new(self.0 + amount.value())
    }

    /// Balance after paying out `amount`. Fails with `NegativeBalance` if the
    /// result would drop below zero.
    pub fn debited(&self, amount: &Amount) -> Result<Balance, AmountError> {
        Balance::new(self.0 - amount.value())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_accepts_positive_value() {
        let amount = Amount::new(dec!(40)).unwrap();
        assert_eq!(amount.value(), dec!(40));
    }

    #[test]
    fn amount_rejects_zero_and_negative() {
        assert!(matches!(
            Amount::new(dec!(0)),
            Err(AmountError::NotPositive(_))
        ));
        assert!(matches!(
            Amount::new(dec!(-5)),
            Err(AmountError::NotPositive(_))
        ));
    }

    #[test]
    fn amount_rejects_sub_cent_precision() {
        assert!(matches!(
            Amount::new(dec!(0.001)),
            Err(AmountError::TooManyDecimals(3))
        ));
        assert!(Amount::new(dec!(0.01)).is_ok());
    }

    #[test]
    fn amount_rejects_values_over_cap() {
        assert!(matches!(
            Amount::new(dec!(1000000000.01)),
            Err(AmountError::Overflow)
        ));
        assert!(Amount::new(dec!(1000000000)).is_ok());
    }

    #[test]
    fn amount_parses_from_string() {
        let amount: Amount = "123.45".parse().unwrap();
        assert_eq!(amount.value(), dec!(123.45));

        let bad: Result<Amount, _> = "abc".parse();
        assert!(matches!(bad, Err(AmountError::Parse(_))));
    }

    #[test]
    fn balance_credit_and_debit() {
        let balance = Balance::new(dec!(100)).unwrap();
        let amount = Amount::new(dec!(40)).unwrap();

        let balance = balance.debited(&amount).unwrap();
        assert_eq!(balance.value(), dec!(60));

        let balance = balance.credited(&amount).unwrap();
        assert_eq!(balance.value(), dec!(100));
    }

    #[test]
    fn balance_debit_to_exactly_zero_is_allowed() {
        let balance = Balance::new(dec!(40)).unwrap();
        let amount = Amount::new(dec!(40)).unwrap();
        assert_eq!(balance.debited(&amount).unwrap().value(), dec!(0));
    }

    #[test]
    fn balance_never_goes_negative() {
        let balance = Balance::new(dec!(10)).unwrap();
        let amount = Amount::new(dec!(10.01)).unwrap();

        assert!(!balance.covers(&amount));
        assert!(matches!(
            balance.debited(&amount),
            Err(AmountError::NegativeBalance)
        ));
    }

    #[test]
    fn balance_rejects_negative_construction() {
        assert!(matches!(
            Balance::new(dec!(-1)),
            Err(AmountError::NegativeBalance)
        ));
    }
}
