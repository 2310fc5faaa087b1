use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use stockroom_core::category_tree::CategoryNode;
use stockroom_core::{Category, Permission};
use stockroom_db::{CategoryPatch, NewCategory};

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    /// New parent; `null` makes the category a root.
    #[serde(default)]
    pub parent_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    /// Ids of the category and every descendant, deepest first.
    pub removed: Vec<String>,
}

/// The whole tree, nested.
pub async fn tree(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryNode>>, ApiError> {
    user.require(Permission::ManageCatalog)?;
    Ok(Json(state.db.categories().tree().await?))
}

pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    user.require(Permission::ManageCatalog)?;
    let category = state.db.categories().create(input).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> Result<Json<Category>, ApiError> {
    user.require(Permission::ManageCatalog)?;
    Ok(Json(state.db.categories().update(&id, patch).await?))
}

pub async fn move_to(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<MoveRequest>,
) -> Result<Json<Category>, ApiError> {
    user.require(Permission::ManageCatalog)?;
    let moved = state
        .db
        .categories()
        .move_to(&id, req.parent_id.as_deref())
        .await?;
    Ok(Json(moved))
}

pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    user.require(Permission::ManageCatalog)?;
    let removed = state.db.categories().delete(&id).await?;
    Ok(Json(DeleteResponse { removed }))
}
