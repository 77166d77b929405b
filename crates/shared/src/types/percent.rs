//! Percentage type with boundary normalization.
//!
//! The legacy schema stored percentages as numeric strings with a trailing
//! `%` suffix (e.g. `"50%"`). This type accepts both that form and plain
//! numbers on the way in, and always carries a plain `Decimal` internally.
//!
//! CRITICAL: Never use floating-point for percentage calculations.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors from percentage parsing and construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PercentError {
    /// The value could not be parsed as a number.
    #[error("Invalid percentage: {0}")]
    Invalid(String),

    /// The value is outside the 0-100 range.
    #[error("Percentage out of range: {0}")]
    OutOfRange(Decimal),
}

/// A percentage in the range 0-100, stored as a `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Percent(Decimal);

impl Percent {
    /// Creates a percentage, rejecting values outside 0-100.
    ///
    /// # Errors
    ///
    /// Returns `PercentError::OutOfRange` if the value is negative or
    /// greater than 100.
    pub fn new(value: Decimal) -> Result<Self, PercentError> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(PercentError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the inner decimal value (0-100).
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Percent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl std::str::FromStr for Percent {
    type Err = PercentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let numeric = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        let value = numeric
            .parse::<Decimal>()
            .map_err(|_| PercentError::Invalid(s.to_string()))?;
        Self::new(value)
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Fully qualified: Decimal has an inherent `serialize` that would
        // shadow the trait method.
        serde::Serialize::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PercentVisitor;

        impl serde::de::Visitor<'_> for PercentVisitor {
            type Value = Percent;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a number or a percentage string like \"50%\"")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Percent, E> {
                v.parse().map_err(serde::de::Error::custom)
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Percent, E> {
                Percent::new(Decimal::from(v)).map_err(serde::de::Error::custom)
            }

            fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<Percent, E> {
                Percent::new(Decimal::from(v)).map_err(serde::de::Error::custom)
            }

            fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<Percent, E> {
                let value = Decimal::try_from(v).map_err(serde::de::Error::custom)?;
                Percent::new(value).map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(PercentVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[rstest]
    #[case("50%", dec!(50))]
    #[case("50", dec!(50))]
    #[case(" 37.5% ", dec!(37.5))]
    #[case("0%", dec!(0))]
    #[case("100%", dec!(100))]
    fn test_parse_accepted_forms(#[case] input: &str, #[case] expected: Decimal) {
        assert_eq!(Percent::from_str(input).unwrap().value(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("%")]
    #[case("abc%")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(matches!(
            Percent::from_str(input),
            Err(PercentError::Invalid(_))
        ));
    }

    #[rstest]
    #[case("-1")]
    #[case("100.01%")]
    fn test_parse_out_of_range(#[case] input: &str) {
        assert!(matches!(
            Percent::from_str(input),
            Err(PercentError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_new_bounds() {
        assert!(Percent::new(dec!(0)).is_ok());
        assert!(Percent::new(dec!(100)).is_ok());
        assert!(Percent::new(dec!(-0.01)).is_err());
        assert!(Percent::new(dec!(100.01)).is_err());
    }

    #[test]
    fn test_display_keeps_suffix() {
        let pct = Percent::new(dec!(37.5)).unwrap();
        assert_eq!(pct.to_string(), "37.5%");
    }

    #[test]
    fn test_serialize_as_plain_value() {
        let pct = Percent::new(dec!(37.5)).unwrap();
        assert_eq!(serde_json::to_string(&pct).unwrap(), "\"37.5\"");

        let back: Percent = serde_json::from_str(&serde_json::to_string(&pct).unwrap()).unwrap();
        assert_eq!(back, pct);
    }

    #[test]
    fn test_deserialize_number_and_string() {
        let from_number: Percent = serde_json::from_str("25").unwrap();
        assert_eq!(from_number.value(), dec!(25));

        let from_string: Percent = serde_json::from_str("\"25%\"").unwrap();
        assert_eq!(from_string.value(), dec!(25));
    }
}
