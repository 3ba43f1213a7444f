use common::{CategoryId, ProductId, ProductTypeId};
use serde::Serialize;

use super::{ProductType, required_name};
use crate::error::DomainError;
use crate::stock::StockAdjustment;
use crate::value_objects::{Money, Quantity};

/// Unit label used when none is given ("dona" is Uzbek for "piece").
pub const DEFAULT_UNIT_LABEL: &str = "dona";

/// A product in the catalog.
///
/// `is_available` is derived: it is true exactly when `on_hand_quantity > 0`
/// and is recomputed on every quantity change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category_id: CategoryId,
    pub product_type_id: Option<ProductTypeId>,
    unit_price: Money,
    pub unit_label: String,
    pub description: Option<String>,
    on_hand_quantity: Quantity,
    is_available: bool,
}

impl Product {
    /// Creates an out-of-stock product in `category_id`.
    pub fn new(
        name: impl Into<String>,
        category_id: CategoryId,
        unit_price: Money,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: ProductId::new(),
            name: required_name("product name", name)?,
            category_id,
            product_type_id: None,
            unit_price: unit_price.unit_price()?,
            unit_label: DEFAULT_UNIT_LABEL.to_string(),
            description: None,
            on_hand_quantity: Quantity::zero(),
            is_available: false,
        })
    }

    /// Replaces the generated id, used when loading a stored product.
    pub fn with_id(mut self, id: ProductId) -> Self {
        self.id = id;
        self
    }

    /// Places the product under a product type without checking its category.
    ///
    /// Use [`Product::assign_type`] for caller-supplied input.
    pub fn with_product_type(mut self, product_type_id: Option<ProductTypeId>) -> Self {
        self.product_type_id = product_type_id;
        self
    }

    /// Sets the unit label; blank labels fall back to [`DEFAULT_UNIT_LABEL`].
    pub fn with_unit_label(mut self, unit_label: impl Into<String>) -> Self {
        let label = unit_label.into();
        self.unit_label = if label.trim().is_empty() {
            DEFAULT_UNIT_LABEL.to_string()
        } else {
            label.trim().to_string()
        };
        self
    }

    /// Sets the free-text description.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description.filter(|d| !d.trim().is_empty());
        self
    }

    /// Sets the initial stock level.
    pub fn with_stock(mut self, quantity: Quantity) -> Result<Self, DomainError> {
        self.set_on_hand_quantity(quantity)?;
        Ok(self)
    }

    /// Places the product under `product_type`, which must belong to the
    /// product's own category.
    pub fn assign_type(&mut self, product_type: Option<&ProductType>) -> Result<(), DomainError> {
        if let Some(product_type) = product_type
            && product_type.category_id != self.category_id
        {
            return Err(DomainError::CategoryMismatch {
                product_type: product_type.name.clone(),
                category: self.category_id.to_string(),
            });
        }
        self.product_type_id = product_type.map(|t| t.id);
        Ok(())
    }

    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn on_hand_quantity(&self) -> Quantity {
        self.on_hand_quantity
    }

    pub fn is_available(&self) -> bool {
        self.is_available
    }

    /// Changes the unit price. Existing line items keep their snapshot.
    pub fn set_unit_price(&mut self, unit_price: Money) -> Result<(), DomainError> {
        self.unit_price = unit_price.unit_price()?;
        Ok(())
    }

    /// Sets the stock level and recomputes availability.
    pub fn set_on_hand_quantity(&mut self, quantity: Quantity) -> Result<(), DomainError> {
        self.on_hand_quantity = quantity.on_hand()?;
        self.is_available = self.on_hand_quantity.is_positive();
        Ok(())
    }

    /// Returns true when the stock level is at or below `threshold`.
    pub fn is_low_stock(&self, threshold: Quantity) -> bool {
        self.on_hand_quantity <= threshold
    }

    /// Removes `quantity` from stock, clamping at zero.
    pub(crate) fn deduct(&mut self, quantity: Quantity) -> StockAdjustment {
        let previous = self.on_hand_quantity;
        let shortfall = previous < quantity;

        self.on_hand_quantity = if shortfall {
            Quantity::zero()
        } else {
            previous - quantity
        };
        self.is_available = self.on_hand_quantity.is_positive();

        StockAdjustment {
            product_id: self.id,
            requested: quantity,
            previous,
            remaining: self.on_hand_quantity,
            shortfall,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;

    fn product(stock: i64) -> Product {
        Product::new("Lavash", CategoryId::new(), Money::from_parts(2500, 2))
            .unwrap()
            .with_stock(Quantity::units(stock))
            .unwrap()
    }

    #[test]
    fn new_product_is_out_of_stock() {
        let p = Product::new("Lavash", CategoryId::new(), Money::from_parts(2500, 2)).unwrap();
        assert_eq!(p.on_hand_quantity(), Quantity::zero());
        assert!(!p.is_available());
        assert_eq!(p.unit_label, DEFAULT_UNIT_LABEL);
    }

    #[test]
    fn availability_follows_quantity() {
        let mut p = product(3);
        assert!(p.is_available());

        p.set_on_hand_quantity(Quantity::zero()).unwrap();
        assert!(!p.is_available());

        p.set_on_hand_quantity(Quantity::from_parts(5, 1)).unwrap();
        assert!(p.is_available());
    }

    #[test]
    fn negative_values_are_rejected() {
        assert!(Product::new("X", CategoryId::new(), Money::from_parts(-1, 0)).is_err());

        let mut p = product(3);
        assert!(p.set_on_hand_quantity(Quantity::units(-1)).is_err());
        assert_eq!(p.on_hand_quantity(), Quantity::units(3));
        assert!(p.set_unit_price(Money::from_parts(-100, 2)).is_err());
    }

    #[test]
    fn values_the_columns_cannot_hold_are_rejected() {
        let mut p = product(3);
        assert!(matches!(
            p.set_on_hand_quantity(Quantity::from_parts(4, 3)),
            Err(DomainError::ExcessPrecision { .. })
        ));
        assert!(matches!(
            p.set_unit_price(Money::from_parts(19_999, 3)),
            Err(DomainError::ExcessPrecision { .. })
        ));
        assert_eq!(p.on_hand_quantity(), Quantity::units(3));
        assert_eq!(p.unit_price(), Money::from_parts(2500, 2));

        assert!(Product::new("X", CategoryId::new(), Money::from_parts(100_000_000, 0)).is_err());
    }

    #[test]
    fn deduct_within_stock() {
        let mut p = product(10);
        let adj = p.deduct(Quantity::units(3));
        assert_eq!(p.on_hand_quantity(), Quantity::units(7));
        assert!(p.is_available());
        assert!(!adj.shortfall);
        assert_eq!(adj.deducted(), Quantity::units(3));
    }

    #[test]
    fn deduct_exact_stock_makes_unavailable() {
        let mut p = product(2);
        let adj = p.deduct(Quantity::units(2));
        assert_eq!(p.on_hand_quantity(), Quantity::zero());
        assert!(!p.is_available());
        assert!(!adj.shortfall);
    }

    #[test]
    fn deduct_beyond_stock_clamps_to_zero() {
        let mut p = product(1);
        let adj = p.deduct(Quantity::units(2));
        assert_eq!(p.on_hand_quantity(), Quantity::zero());
        assert!(!p.is_available());
        assert!(adj.shortfall);
        assert_eq!(adj.deducted(), Quantity::units(1));
    }

    #[test]
    fn low_stock_threshold_is_inclusive() {
        assert!(product(5).is_low_stock(Quantity::units(5)));
        assert!(!product(6).is_low_stock(Quantity::units(5)));
    }

    #[test]
    fn assign_type_checks_category() {
        let food = Category::new("Food").unwrap();
        let drinks = Category::new("Drinks").unwrap();
        let pizza = ProductType::new(&food, "Pizza").unwrap();
        let juice = ProductType::new(&drinks, "Juice").unwrap();

        let mut p = Product::new("Margherita", food.id, Money::from_parts(5, 0)).unwrap();
        p.assign_type(Some(&pizza)).unwrap();
        assert_eq!(p.product_type_id, Some(pizza.id));
        assert_eq!(p.category_id, food.id);

        assert!(matches!(
            p.assign_type(Some(&juice)),
            Err(DomainError::CategoryMismatch { .. })
        ));
        assert_eq!(p.product_type_id, Some(pizza.id));
    }

    #[test]
    fn blank_unit_label_falls_back() {
        let p = product(1).with_unit_label("  ");
        assert_eq!(p.unit_label, DEFAULT_UNIT_LABEL);
        let p = p.with_unit_label("kg");
        assert_eq!(p.unit_label, "kg");
    }
}
