//! User registration and profile endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use domain::{User, UserPatch};
use serde::Deserialize;
use store::Store;

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub telegram_id: String,
    #[serde(flatten)]
    pub profile: UserPatch,
}

/// POST /users: returns the user for a Telegram id, creating it on first contact.
#[tracing::instrument(skip(state, req), fields(telegram_id = %req.telegram_id))]
pub async fn register<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.users.register(&req.telegram_id, req.profile).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /users
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.users.list().await?))
}

/// GET /users/{telegram_id}
#[tracing::instrument(skip(state))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(telegram_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.users.get_by_telegram_id(&telegram_id).await?))
}

/// PATCH /users/{telegram_id}: updates the fields present in the body.
#[tracing::instrument(skip(state, patch))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    Path(telegram_id): Path<String>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(
        state.users.update_by_telegram_id(&telegram_id, patch).await?,
    ))
}
