//! Money helpers - rounding, validation and JSON formatting for prices and totals.
//!
//! Amounts are `rust_decimal::Decimal` everywhere and always carry exactly two
//! decimal places once they leave this module.

use crate::errors::{Error, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serializer;

/// Decimal places kept for every stored amount
pub const SCALE: u32 = 2;

/// Largest amount a `Decimal(10, 2)` column can hold
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

/// Rounds half away from zero to two places and pads the scale, so `25` becomes `25.00`.
#[must_use]
pub fn round(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(SCALE);
    rounded
}

/// Checks that a price is non-negative and fits the column, returning it rounded.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] for negative or oversized amounts.
pub fn validate_price(price: Decimal) -> Result<Decimal> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(Error::InvalidAmount { amount: price });
    }
    let rounded = round(price);
    if rounded > MAX_AMOUNT {
        return Err(Error::InvalidAmount { amount: price });
    }
    Ok(rounded)
}

/// Sums `price * quantity` over a set of lines and rounds the result.
pub fn line_total<I>(lines: I) -> Decimal
where
    I: IntoIterator<Item = (Decimal, i32)>,
{
    let sum = lines
        .into_iter()
        .fold(Decimal::ZERO, |acc, (price, quantity)| {
            acc + price * Decimal::from(quantity)
        });
    round(sum)
}

/// `serialize_with` target: writes amounts as two-decimal strings (`"25.00"`).
///
/// # Errors
/// Propagates serializer failures.
pub fn serialize<S>(amount: &Decimal, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&round(*amount))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_round_pads_scale() {
        assert_eq!(round(Decimal::from(25)).to_string(), "25.00");
        assert_eq!(round(Decimal::new(1005, 3)).to_string(), "1.01");
        assert_eq!(round(Decimal::new(1004, 3)).to_string(), "1.00");
    }

    #[test]
    fn test_line_total() {
        let total = line_total([(Decimal::new(1000, 2), 2), (Decimal::new(500, 2), 1)]);
        assert_eq!(total.to_string(), "25.00");

        let empty = line_total(std::iter::empty());
        assert_eq!(empty.to_string(), "0.00");
    }

    #[test]
    fn test_validate_price() {
        assert_eq!(validate_price(Decimal::new(1999, 2)).unwrap().to_string(), "19.99");
        assert_eq!(validate_price(Decimal::ZERO).unwrap().to_string(), "0.00");
        assert!(matches!(
            validate_price(Decimal::new(-1, 2)),
            Err(Error::InvalidAmount { .. })
        ));
        assert!(matches!(
            validate_price(Decimal::from(100_000_000)),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_validate_price_column_limit() {
        let largest = Decimal::new(9_999_999_999, 2);
        assert_eq!(validate_price(largest).unwrap().to_string(), "99999999.99");
        assert!(matches!(
            validate_price(Decimal::new(99_999_999_995, 3)),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_serialize_as_two_decimal_string() {
        #[derive(serde::Serialize)]
        struct Wrapper {
            #[serde(serialize_with = "serialize")]
            amount: Decimal,
        }
        let json = serde_json::to_string(&Wrapper {
            amount: Decimal::new(75, 1),
        })
        .unwrap();
        assert_eq!(json, r#"{"amount":"7.50"}"#);
    }
}
