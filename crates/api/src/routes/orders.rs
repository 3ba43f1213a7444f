//! Order, line item and status endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{OrderId, OrderItemId, ProductId, UserId};
use domain::{
    AddOrUpdateItem, Order, OrderStatus, PlaceOrder, Quantity, RemoveItem, StatusChange,
    StockAdjustment, TransitionStatus, parse_id,
};
use serde::{Deserialize, Serialize};
use store::{OrderQuery, Store};

use crate::AppState;
use crate::error::ApiError;

// -- Request types --

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct PutItemRequest {
    pub product_id: String,
    pub quantity: Quantity,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListParams {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// -- Response types --

#[derive(Serialize)]
pub struct StatusResponse {
    pub order: Order,
    pub change: StatusChange,
    pub adjustments: Vec<StockAdjustment>,
}

fn parse_status(status: &str) -> Result<OrderStatus, ApiError> {
    status
        .parse()
        .map_err(|e: domain::UnknownStatus| ApiError::BadRequest(e.to_string()))
}

// -- Handlers --

/// POST /orders: places an empty order for a user.
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let user_id = parse_id::<UserId>("user", &req.user_id)?;
    let order = state.orders.place_order(PlaceOrder::new(user_id)).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders?user_id=&status=&limit=&offset=
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Query(params): Query<OrderListParams>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let mut query = OrderQuery::new();
    if let Some(id) = params.user_id {
        query.user_id = Some(parse_id::<UserId>("user", &id)?);
    }
    if let Some(status) = params.status {
        query = query.status(parse_status(&status)?);
    }
    if let Some(limit) = params.limit {
        query = query.limit(limit);
    }
    if let Some(offset) = params.offset {
        query = query.offset(offset);
    }
    Ok(Json(state.orders.list_orders(query).await?))
}

/// GET /users/{telegram_id}/orders: newest first, 404 when the user has none.
pub async fn for_user<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(telegram_id): Path<String>,
) -> Result<Json<Vec<Order>>, ApiError> {
    let user = state.users.get_by_telegram_id(&telegram_id).await?;
    Ok(Json(state.orders.orders_for_user(user.id).await?))
}

/// GET /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id::<OrderId>("order", &id)?;
    Ok(Json(state.orders.get_order(id).await?))
}

/// DELETE /orders/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id::<OrderId>("order", &id)?;
    state.orders.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /orders/{id}/items: sets the quantity of a product's line at its current price.
#[tracing::instrument(skip(state, req))]
pub async fn put_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<PutItemRequest>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_id::<OrderId>("order", &id)?;
    let product_id = parse_id::<ProductId>("product", &req.product_id)?;
    let order = state
        .orders
        .add_or_update_item(AddOrUpdateItem::new(order_id, product_id, req.quantity))
        .await?;
    Ok(Json(order))
}

/// DELETE /orders/{id}/items/{item_id}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<Order>, ApiError> {
    let order_id = parse_id::<OrderId>("order", &id)?;
    let item_id = parse_id::<OrderItemId>("order item", &item_id)?;
    let order = state
        .orders
        .remove_item(RemoveItem::new(order_id, item_id))
        .await?;
    Ok(Json(order))
}

/// POST /orders/{id}/total
#[tracing::instrument(skip(state))]
pub async fn recompute_total<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id::<OrderId>("order", &id)?;
    Ok(Json(state.orders.recompute_total(id).await?))
}

/// PUT /orders/{id}/status: moves the order; completing it deducts stock once.
#[tracing::instrument(skip(state, req), fields(status = %req.status))]
pub async fn set_status<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    let order_id = parse_id::<OrderId>("order", &id)?;
    let status = parse_status(&req.status)?;
    let transition = state
        .orders
        .transition_status(TransitionStatus::new(order_id, status))
        .await?;

    Ok(Json(StatusResponse {
        order: transition.order,
        change: transition.change,
        adjustments: transition.adjustments,
    }))
}

/// POST /orders/{id}/confirm
#[tracing::instrument(skip(state))]
pub async fn confirm<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Order>, ApiError> {
    let id = parse_id::<OrderId>("order", &id)?;
    Ok(Json(state.orders.confirm_order(id).await?))
}
