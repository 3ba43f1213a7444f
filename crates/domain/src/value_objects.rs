//! Value objects shared by the catalog and order models.

use std::ops::Sub;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Number of decimal places money is stored with.
pub const MONEY_SCALE: u32 = 2;

/// Number of decimal places quantities are stored with.
pub const QUANTITY_SCALE: u32 = 2;

/// Largest value a `NUMERIC(10,2)` column holds: unit prices and quantities.
pub fn max_unit_value() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// Largest value a `NUMERIC(12,2)` column holds: line and order totals.
pub fn max_total_value() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

fn check_scale(field: &'static str, value: Decimal, max_scale: u32) -> Result<(), DomainError> {
    if value.normalize().scale() > max_scale {
        return Err(DomainError::ExcessPrecision {
            field,
            value,
            max_scale,
        });
    }
    Ok(())
}

fn check_max(field: &'static str, value: Decimal, max: Decimal) -> Result<(), DomainError> {
    if value.abs() > max {
        return Err(DomainError::OutOfRange { field, max });
    }
    Ok(())
}

/// Monetary amount backed by an exact decimal.
///
/// Arithmetic never goes through floating point and never panics: products
/// and sums are checked against the column they are stored in. Amounts
/// produced by [`Money::times`] are rounded to [`MONEY_SCALE`] places with
/// banker's rounding, the same way a `NUMERIC(12,2)` column stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Builds an amount from an integer mantissa and scale, e.g. `(1050, 2)` is 10.50.
    pub fn from_parts(mantissa: i64, scale: u32) -> Self {
        Self(Decimal::new(mantissa, scale))
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the raw decimal amount.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is below zero.
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Multiplies a unit price by a quantity, rounding to the money scale.
    pub fn times(&self, quantity: Quantity) -> Result<Money, DomainError> {
        let out_of_range = || DomainError::OutOfRange {
            field: "line total",
            max: max_total_value(),
        };
        let product = self
            .0
            .checked_mul(quantity.value())
            .ok_or_else(out_of_range)?
            .round_dp(MONEY_SCALE);
        check_max("line total", product, max_total_value())?;
        Ok(Money(product))
    }

    /// Adds two amounts, bounded by the order total column.
    pub fn checked_add(self, rhs: Money) -> Result<Money, DomainError> {
        let out_of_range = || DomainError::OutOfRange {
            field: "order total",
            max: max_total_value(),
        };
        let sum = self.0.checked_add(rhs.0).ok_or_else(out_of_range)?;
        check_max("order total", sum, max_total_value())?;
        Ok(Money(sum))
    }

    /// Sums amounts, failing as soon as the running total leaves the order total range.
    pub fn total<I: IntoIterator<Item = Money>>(amounts: I) -> Result<Money, DomainError> {
        amounts
            .into_iter()
            .try_fold(Money::zero(), |acc, amount| acc.checked_add(amount))
    }

    /// Validates a unit price: not negative, at most two places, fits `NUMERIC(10,2)`.
    pub fn unit_price(self) -> Result<Self, DomainError> {
        if self.is_negative() {
            return Err(DomainError::NegativePrice { price: self.0 });
        }
        check_scale("price", self.0, MONEY_SCALE)?;
        check_max("price", self.0, max_unit_value())?;
        Ok(self)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl std::str::FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Decimal>().map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

/// Quantity of a product, in the product's unit (pieces, kilograms, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(Decimal);

impl Quantity {
    /// Wraps a decimal quantity.
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    /// Builds a quantity from an integer mantissa and scale.
    pub fn from_parts(mantissa: i64, scale: u32) -> Self {
        Self(Decimal::new(mantissa, scale))
    }

    /// Builds a whole-unit quantity.
    pub fn units(count: i64) -> Self {
        Self(Decimal::from(count))
    }

    /// Returns zero.
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the raw decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Returns true if the quantity is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the quantity is below zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Validates a quantity for a line item.
    pub fn ordered(self) -> Result<Self, DomainError> {
        if !self.is_positive() {
            return Err(DomainError::InvalidQuantity { quantity: self.0 });
        }
        self.storable()
    }

    /// Validates a quantity held in stock.
    pub fn on_hand(self) -> Result<Self, DomainError> {
        if self.is_negative() {
            return Err(DomainError::NegativeStock { quantity: self.0 });
        }
        self.storable()
    }

    fn storable(self) -> Result<Self, DomainError> {
        check_scale("quantity", self.0, QUANTITY_SCALE)?;
        check_max("quantity", self.0, max_unit_value())?;
        Ok(self)
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl std::str::FromStr for Quantity {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<Decimal>().map(Quantity)
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl Sub for Quantity {
    type Output = Quantity;

    fn sub(self, rhs: Self) -> Self::Output {
        Quantity(self.0 - rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_display_uses_two_places() {
        assert_eq!(Money::from_parts(4100, 2).to_string(), "41.00");
        assert_eq!(Money::from_parts(55, 1).to_string(), "5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn money_times_quantity() {
        let price = Money::from_parts(1000, 2);
        assert_eq!(price.times(Quantity::units(3)).unwrap(), Money::from_parts(3000, 2));

        let price = Money::from_parts(550, 2);
        assert_eq!(price.times(Quantity::units(2)).unwrap(), Money::from_parts(1100, 2));
    }

    #[test]
    fn money_times_fractional_quantity_rounds_half_even() {
        // 3.33 * 1.5 = 4.995 -> 5.00 (half to even on the last digit 9.5)
        let price = Money::from_parts(333, 2);
        assert_eq!(price.times(Quantity::from_parts(15, 1)).unwrap(), Money::from_parts(500, 2));

        // 0.25 * 0.5 = 0.125 -> 0.12
        let price = Money::from_parts(25, 2);
        assert_eq!(price.times(Quantity::from_parts(5, 1)).unwrap(), Money::from_parts(12, 2));
    }

    #[test]
    fn money_times_overflow_is_an_error() {
        let price = Money::from_parts(9_999_999_999, 2);
        let huge: Quantity = "79228162514264337593543950335".parse().unwrap();
        assert!(matches!(
            price.times(huge),
            Err(DomainError::OutOfRange { field: "line total", .. })
        ));

        // 99999999.99 * 99999999.99 fits a Decimal but not NUMERIC(12,2)
        let quantity = Quantity::new(max_unit_value());
        assert!(matches!(
            price.times(quantity),
            Err(DomainError::OutOfRange { .. })
        ));
    }

    #[test]
    fn money_total() {
        let total = Money::total([Money::from_parts(3000, 2), Money::from_parts(1100, 2)]).unwrap();
        assert_eq!(total, Money::from_parts(4100, 2));

        assert!(Money::total(std::iter::empty()).unwrap().is_zero());
    }

    #[test]
    fn money_total_is_bounded() {
        let big = Money::new(max_total_value());
        assert!(matches!(
            Money::total([big, Money::from_parts(1, 2)]),
            Err(DomainError::OutOfRange { field: "order total", .. })
        ));
        assert_eq!(Money::total([big]).unwrap(), big);
    }

    #[test]
    fn unit_price_rules() {
        assert!(matches!(
            Money::from_parts(-1, 2).unit_price(),
            Err(DomainError::NegativePrice { .. })
        ));
        assert!(Money::zero().unit_price().is_ok());
        assert!(matches!(
            Money::from_parts(10_005, 3).unit_price(),
            Err(DomainError::ExcessPrecision { field: "price", .. })
        ));
        // trailing zeros beyond two places are not extra precision
        assert!(Money::from_parts(10_500, 3).unit_price().is_ok());
        assert!(Money::new(max_unit_value()).unit_price().is_ok());
        assert!(matches!(
            Money::from_parts(100_000_000, 0).unit_price(),
            Err(DomainError::OutOfRange { field: "price", .. })
        ));
    }

    #[test]
    fn ordered_quantity_must_be_positive() {
        assert!(Quantity::units(1).ordered().is_ok());
        assert!(matches!(
            Quantity::zero().ordered(),
            Err(DomainError::InvalidQuantity { .. })
        ));
        assert!(Quantity::units(-2).ordered().is_err());
    }

    #[test]
    fn quantities_are_limited_to_two_places() {
        assert!(Quantity::from_parts(125, 2).ordered().is_ok());
        assert!(matches!(
            Quantity::from_parts(1, 3).ordered(),
            Err(DomainError::ExcessPrecision { field: "quantity", .. })
        ));
        assert!(matches!(
            Quantity::from_parts(4, 3).on_hand(),
            Err(DomainError::ExcessPrecision { .. })
        ));
    }

    #[test]
    fn quantities_must_fit_the_column() {
        let huge: Quantity = "79228162514264337593543950335".parse().unwrap();
        assert!(matches!(
            huge.ordered(),
            Err(DomainError::OutOfRange { field: "quantity", .. })
        ));
        assert!(Quantity::new(max_unit_value()).on_hand().is_ok());
        assert!(Quantity::units(100_000_000).on_hand().is_err());
    }

    #[test]
    fn on_hand_quantity_must_not_be_negative() {
        assert!(Quantity::zero().on_hand().is_ok());
        assert!(matches!(
            Quantity::from_parts(-5, 1).on_hand(),
            Err(DomainError::NegativeStock { .. })
        ));
    }

    #[test]
    fn quantity_display_is_normalized() {
        assert_eq!(Quantity::from_parts(700, 2).to_string(), "7");
        assert_eq!(Quantity::from_parts(250, 2).to_string(), "2.5");
    }

    #[test]
    fn parse_money_and_quantity() {
        assert_eq!("10.00".parse::<Money>().unwrap(), Money::from_parts(1000, 2));
        assert_eq!(" 2 ".parse::<Quantity>().unwrap(), Quantity::units(2));
        assert!("ten".parse::<Money>().is_err());
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&Money::from_parts(1050, 2)).unwrap();
        assert_eq!(json, "\"10.50\"");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_parts(1050, 2));
    }
}
