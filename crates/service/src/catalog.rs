//! Catalog service: categories, product types and products.

use std::sync::Arc;

use common::{CategoryId, ProductId, ProductTypeId};
use domain::{
    Category, DomainError, LowStockNotice, Money, Notification, Product, ProductType, Quantity,
    StockPolicy,
};
use notifications::NotificationSink;
use serde::Deserialize;
use store::{ProductQuery, Store, StoreExt, Transaction};

use crate::error::{Result, ServiceError};

/// Input for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub category_id: CategoryId,
    #[serde(default)]
    pub product_type_id: Option<ProductTypeId>,
    pub unit_price: Money,
    #[serde(default)]
    pub unit_label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Quantity,
}

/// Service for browsing and maintaining the catalog.
pub struct CatalogService<S, N> {
    store: S,
    sink: Arc<N>,
    policy: StockPolicy,
}

impl<S: Store, N: NotificationSink> CatalogService<S, N> {
    pub fn new(store: S, sink: Arc<N>, policy: StockPolicy) -> Self {
        Self {
            store,
            sink,
            policy,
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_category(&self, name: &str) -> Result<Category> {
        let category = Category::new(name)?;

        let mut tx = self.store.begin().await?;
        tx.insert_category(&category)
            .await
            .map_err(ServiceError::duplicate("Category", &category.name))?;
        tx.commit().await?;

        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    #[tracing::instrument(skip(self))]
    pub async fn rename_category(&self, id: CategoryId, name: &str) -> Result<Category> {
        let mut tx = self.store.begin().await?;
        let mut category = tx
            .get_category(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", id))?;
        category.rename(name)?;
        tx.update_category(&category)
            .await
            .map_err(ServiceError::duplicate("Category", &category.name))?;
        tx.commit().await?;
        Ok(category)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_categories().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_product_type(
        &self,
        category_id: CategoryId,
        name: &str,
    ) -> Result<ProductType> {
        let mut tx = self.store.begin().await?;
        let category = tx
            .get_category(category_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Category", category_id))?;
        let product_type = ProductType::new(&category, name)?;
        tx.insert_product_type(&product_type)
            .await
            .map_err(ServiceError::duplicate("Product type", &product_type.name))?;
        tx.commit().await?;
        Ok(product_type)
    }

    pub async fn list_product_types(&self, category_id: CategoryId) -> Result<Vec<ProductType>> {
        let mut tx = self.store.begin().await?;
        if tx.get_category(category_id).await?.is_none() {
            return Err(DomainError::not_found("Category", category_id).into());
        }
        Ok(tx.list_product_types(category_id).await?)
    }

    /// Creates a product. A product type, when given, must belong to the product's category.
    ///
    /// A product created at or below the low-stock threshold raises the same
    /// admin alert as a stock change would.
    #[tracing::instrument(skip(self), fields(name = %input.name))]
    pub async fn create_product(&self, input: NewProduct) -> Result<Product> {
        let mut product = Product::new(input.name, input.category_id, input.unit_price)?
            .with_unit_label(input.unit_label.unwrap_or_default())
            .with_description(input.description)
            .with_stock(input.quantity)?;

        let mut uow = self.store.unit_of_work().await?;
        if uow.tx().get_category(product.category_id).await?.is_none() {
            return Err(DomainError::not_found("Category", product.category_id).into());
        }
        if let Some(type_id) = input.product_type_id {
            let product_type = uow
                .tx()
                .get_product_type(type_id)
                .await?
                .ok_or_else(|| DomainError::not_found("Product type", type_id))?;
            product.assign_type(Some(&product_type))?;
        }
        uow.tx().insert_product(&product).await?;

        if self.policy.is_low_stock(&product) {
            let notice = low_stock_notice(uow.tx(), &product).await?;
            uow.defer(Notification::LowStock(notice));
        }

        let notifications = uow.commit().await?;
        tracing::info!(product_id = %product.id, "product created");
        self.sink.dispatch(notifications).await;
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))?;
        Ok(product)
    }

    /// Lists the available products of a category.
    ///
    /// An empty result is reported as not found.
    pub async fn products_in_category(&self, category_id: CategoryId) -> Result<Vec<Product>> {
        let products = self
            .query_products(ProductQuery::in_category(category_id).available())
            .await?;
        if products.is_empty() {
            return Err(DomainError::not_found("Products in category", category_id).into());
        }
        Ok(products)
    }

    pub async fn query_products(&self, query: ProductQuery) -> Result<Vec<Product>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.query_products(&query).await?)
    }

    /// Changes a product's unit price. Existing order lines keep their snapshot.
    #[tracing::instrument(skip(self))]
    pub async fn set_product_price(&self, id: ProductId, unit_price: Money) -> Result<Product> {
        let mut tx = self.store.begin().await?;
        let mut product = tx
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))?;
        product.set_unit_price(unit_price)?;
        tx.update_product_price(&product).await?;
        tx.commit().await?;
        Ok(product)
    }

    /// Sets a product's stock; raises a low-stock alert when it ends at or below the threshold.
    #[tracing::instrument(skip(self))]
    pub async fn set_product_stock(&self, id: ProductId, quantity: Quantity) -> Result<Product> {
        let mut uow = self.store.unit_of_work().await?;
        let mut product = uow
            .tx()
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))?;
        product.set_on_hand_quantity(quantity)?;
        uow.tx().update_product_stock(&product).await?;

        if self.policy.is_low_stock(&product) {
            let notice = low_stock_notice(uow.tx(), &product).await?;
            uow.defer(Notification::LowStock(notice));
        }

        let notifications = uow.commit().await?;
        self.sink.dispatch(notifications).await;
        Ok(product)
    }
}

/// Builds the admin alert for `product`, reading its category and type names.
pub(crate) async fn low_stock_notice<T: Transaction>(
    tx: &mut T,
    product: &Product,
) -> Result<LowStockNotice> {
    let category = tx
        .get_category(product.category_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Category", product.category_id))?;
    let product_type = match product.product_type_id {
        Some(type_id) => tx.get_product_type(type_id).await?,
        None => None,
    };
    Ok(LowStockNotice::new(product, &category, product_type.as_ref()))
}
