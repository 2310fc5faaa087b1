use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use stockroom_core::{Permission, Store};
use stockroom_db::{NewStore, StorePatch};

pub async fn list(user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<Store>>, ApiError> {
    user.require(Permission::ManageStores)?;
    Ok(Json(state.db.stores().list_all().await?))
}

pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewStore>,
) -> Result<(StatusCode, Json<Store>), ApiError> {
    user.require(Permission::ManageStores)?;
    let store = state.db.stores().create(input).await?;
    Ok((StatusCode::CREATED, Json(store)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<StorePatch>,
) -> Result<Json<Store>, ApiError> {
    user.require(Permission::ManageStores)?;
    Ok(Json(state.db.stores().update(&id, patch).await?))
}

pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageStores)?;
    state.db.stores().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
