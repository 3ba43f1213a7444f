//! Domain error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::order::OrderStatus;

/// Errors raised by domain rules.
///
/// Every variant is either a validation failure or a missing reference.
/// Both abort the surrounding write without side effects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Ordered quantity was zero or negative.
    #[error("Invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: Decimal },

    /// A price was negative.
    #[error("Invalid price: {price} (must not be negative)")]
    NegativePrice { price: Decimal },

    /// A stock quantity was negative.
    #[error("Invalid stock quantity: {quantity} (must not be negative)")]
    NegativeStock { quantity: Decimal },

    /// A price or quantity has more decimal places than is stored.
    #[error("{field} {value} has more than {max_scale} decimal places")]
    ExcessPrecision {
        field: &'static str,
        value: Decimal,
        max_scale: u32,
    },

    /// A price, quantity or total does not fit its column.
    #[error("{field} exceeds the maximum of {max}")]
    OutOfRange { field: &'static str, max: Decimal },

    /// A required name was blank.
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    /// A unique name is already taken.
    #[error("{entity} named '{name}' already exists")]
    Duplicate { entity: &'static str, name: String },

    /// The product type belongs to another category than the product.
    #[error("Product type {product_type} does not belong to category {category}")]
    CategoryMismatch {
        product_type: String,
        category: String,
    },

    /// Identifier could not be parsed.
    #[error("Malformed {entity} id: {value:?}")]
    MalformedId { entity: &'static str, value: String },

    /// Status transition out of a terminal state.
    #[error("Invalid state transition: cannot move order from {from} to {to}")]
    InvalidStateTransition { from: OrderStatus, to: OrderStatus },

    /// Items of a finished order can no longer change.
    #[error("Order is {status}; its items can no longer be modified")]
    OrderClosed { status: OrderStatus },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl DomainError {
    /// Builds a not-found error for the given entity kind.
    pub fn not_found(entity: &'static str, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Returns true for missing references.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::NotFound { .. })
    }

    /// Returns true for every rejection of caller input.
    pub fn is_validation(&self) -> bool {
        !self.is_not_found()
    }
}

/// Parses an identifier, mapping failures to [`DomainError::MalformedId`].
pub fn parse_id<T: std::str::FromStr>(entity: &'static str, value: &str) -> Result<T, DomainError> {
    value.parse().map_err(|_| DomainError::MalformedId {
        entity,
        value: value.to_string(),
    })
}
