//! Category, product type and product endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{CategoryId, ProductId, ProductTypeId};
use domain::{Category, Money, Product, ProductType, Quantity, parse_id};
use serde::Deserialize;
use service::NewProduct;
use store::{ProductQuery, Store};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct PriceRequest {
    pub unit_price: Money,
}

#[derive(Deserialize)]
pub struct StockRequest {
    pub quantity: Quantity,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub category_id: Option<String>,
    pub product_type_id: Option<String>,
    #[serde(default)]
    pub available: bool,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl ProductListParams {
    fn into_query(self) -> Result<ProductQuery, ApiError> {
        let mut query = ProductQuery::new();
        if let Some(id) = self.category_id {
            query.category_id = Some(parse_id::<CategoryId>("category", &id)?);
        }
        if let Some(id) = self.product_type_id {
            query = query.product_type(parse_id::<ProductTypeId>("product type", &id)?);
        }
        if self.available {
            query = query.available();
        }
        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        Ok(query)
    }
}

// -- Categories --

/// POST /categories
#[tracing::instrument(skip(state, req))]
pub async fn create_category<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.catalog.create_category(&req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /categories
pub async fn list_categories<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.catalog.list_categories().await?))
}

/// PUT /categories/{id}
#[tracing::instrument(skip(state, req))]
pub async fn rename_category<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<NameRequest>,
) -> Result<Json<Category>, ApiError> {
    let id = parse_id::<CategoryId>("category", &id)?;
    Ok(Json(state.catalog.rename_category(id, &req.name).await?))
}

/// POST /categories/{id}/types
#[tracing::instrument(skip(state, req))]
pub async fn create_product_type<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<ProductType>), ApiError> {
    let id = parse_id::<CategoryId>("category", &id)?;
    let product_type = state.catalog.create_product_type(id, &req.name).await?;
    Ok((StatusCode::CREATED, Json(product_type)))
}

/// GET /categories/{id}/types
pub async fn list_product_types<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ProductType>>, ApiError> {
    let id = parse_id::<CategoryId>("category", &id)?;
    Ok(Json(state.catalog.list_product_types(id).await?))
}

/// GET /categories/{id}/products: available products only, 404 when there are none.
pub async fn products_in_category<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let id = parse_id::<CategoryId>("category", &id)?;
    Ok(Json(state.catalog.products_in_category(id).await?))
}

// -- Products --

/// POST /products
#[tracing::instrument(skip(state, req), fields(name = %req.name))]
pub async fn create_product<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = state.catalog.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /products?category_id=&product_type_id=&available=&limit=&offset=
pub async fn list_products<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let query = params.into_query()?;
    Ok(Json(state.catalog.query_products(query).await?))
}

/// GET /products/{id}
pub async fn get_product<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id::<ProductId>("product", &id)?;
    Ok(Json(state.catalog.get_product(id).await?))
}

/// PUT /products/{id}/price
#[tracing::instrument(skip(state, req))]
pub async fn set_price<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<PriceRequest>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id::<ProductId>("product", &id)?;
    Ok(Json(state.catalog.set_product_price(id, req.unit_price).await?))
}

/// PUT /products/{id}/stock
#[tracing::instrument(skip(state, req))]
pub async fn set_stock<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<StockRequest>,
) -> Result<Json<Product>, ApiError> {
    let id = parse_id::<ProductId>("product", &id)?;
    Ok(Json(state.catalog.set_product_stock(id, req.quantity).await?))
}
