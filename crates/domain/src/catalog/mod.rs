//! Catalog model: categories, product types and products.

mod category;
mod product;

pub use category::{Category, ProductType};
pub use product::{DEFAULT_UNIT_LABEL, Product};

/// Trims a name and rejects it when nothing is left.
pub(crate) fn required_name(field: &'static str, value: impl Into<String>) -> Result<String, crate::DomainError> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(crate::DomainError::EmptyField { field })
    } else {
        Ok(trimmed.to_string())
    }
}
