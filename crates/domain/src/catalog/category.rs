use common::{CategoryId, ProductTypeId};
use serde::{Deserialize, Serialize};

use super::required_name;
use crate::error::DomainError;

/// Top-level grouping of the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    /// Creates a category with a fresh id.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            id: CategoryId::new(),
            name: required_name("category name", name)?,
        })
    }

    /// Renames the category. Products keep referencing it by id.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), DomainError> {
        self.name = required_name("category name", name)?;
        Ok(())
    }
}

/// Optional grouping of products inside a category, e.g. "Pizza" under "Food".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    pub id: ProductTypeId,
    pub category_id: CategoryId,
    pub name: String,
}

impl ProductType {
    /// Creates a product type inside `category`.
    pub fn new(category: &Category, name: impl Into<String>) -> Result<Self, DomainError> {
        Ok(Self {
            id: ProductTypeId::new(),
            category_id: category.id,
            name: required_name("product type name", name)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_name_is_trimmed() {
        let category = Category::new("  Drinks ").unwrap();
        assert_eq!(category.name, "Drinks");
    }

    #[test]
    fn blank_category_name_is_rejected() {
        assert!(matches!(
            Category::new("   "),
            Err(DomainError::EmptyField { .. })
        ));
    }

    #[test]
    fn rename_keeps_id() {
        let mut category = Category::new("Drinks").unwrap();
        let id = category.id;
        category.rename("Beverages").unwrap();
        assert_eq!(category.id, id);
        assert_eq!(category.name, "Beverages");
        assert!(category.rename("").is_err());
        assert_eq!(category.name, "Beverages");
    }

    #[test]
    fn product_type_belongs_to_category() {
        let category = Category::new("Food").unwrap();
        let product_type = ProductType::new(&category, "Pizza").unwrap();
        assert_eq!(product_type.category_id, category.id);
    }
}
