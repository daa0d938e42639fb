//! Unit and line pricing.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::selection::Selection;
use crate::CoreError;

/// Price added per size step on custom-size products (0.50).
pub const DEFAULT_PRICE_PER_INCREMENT: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// Line quantity. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    /// Builds a quantity, raising zero to one.
    #[must_use]
    pub fn new(n: u32) -> Self {
        Self(n.max(1))
    }

    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// One less, but never below one.
    #[must_use]
    pub fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1).max(1))
    }

    /// Combined quantity when merging two additions of the same line.
    #[must_use]
    pub fn merge(self, other: Quantity) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

/// `base + Σ selected deltas`.
#[must_use]
pub fn unit_price(base: Decimal, selection: &Selection) -> Decimal {
    base + selection.price_delta()
}

/// `unit × quantity`.
#[must_use]
pub fn total_price(unit: Decimal, quantity: Quantity) -> Decimal {
    unit * Decimal::from(quantity.get())
}

/// Stepped pricing for products sold by custom length and width (signage,
/// banners). Each full increment above the minimum adds
/// `price_per_increment` to the base price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizePricing {
    pub base_price: Decimal,
    pub min_length: Decimal,
    pub min_width: Decimal,
    pub length_increment: Decimal,
    pub width_increment: Decimal,
    pub price_per_increment: Decimal,
}

impl SizePricing {
    /// Size pricing with the default step price.
    #[must_use]
    pub fn new(
        base_price: Decimal,
        min_length: Decimal,
        min_width: Decimal,
        length_increment: Decimal,
        width_increment: Decimal,
    ) -> Self {
        Self {
            base_price,
            min_length,
            min_width,
            length_increment,
            width_increment,
            price_per_increment: DEFAULT_PRICE_PER_INCREMENT,
        }
    }

    /// `base + (⌊(L-minL)/incL⌋ + ⌊(W-minW)/incW⌋) × price_per_increment`.
    ///
    /// Dimensions below their minimum contribute zero steps.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSizePricing`] if either increment is not
    /// positive.
    pub fn unit_price(&self, length: Decimal, width: Decimal) -> Result<Decimal, CoreError> {
        let length_steps = steps(length, self.min_length, self.length_increment, "length")?;
        let width_steps = steps(width, self.min_width, self.width_increment, "width")?;
        Ok(self.base_price + (length_steps + width_steps) * self.price_per_increment)
    }
}

fn steps(
    value: Decimal,
    minimum: Decimal,
    increment: Decimal,
    axis: &str,
) -> Result<Decimal, CoreError> {
    if increment <= Decimal::ZERO {
        return Err(CoreError::InvalidSizePricing(format!(
            "{axis} increment must be positive, got {increment}"
        )));
    }
    let over = value - minimum;
    if over <= Decimal::ZERO {
        return Ok(Decimal::ZERO);
    }
    Ok((over / increment).floor())
}
