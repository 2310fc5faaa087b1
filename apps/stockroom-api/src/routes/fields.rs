use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use stockroom_core::{Field, Permission};
use stockroom_db::{FieldPatch, NewField};

pub async fn list(user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<Field>>, ApiError> {
    user.require(Permission::ManageCatalog)?;
    Ok(Json(state.db.fields().list_all().await?))
}

pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewField>,
) -> Result<(StatusCode, Json<Field>), ApiError> {
    user.require(Permission::ManageCatalog)?;
    let field = state.db.fields().create(input).await?;
    Ok((StatusCode::CREATED, Json(field)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<FieldPatch>,
) -> Result<Json<Field>, ApiError> {
    user.require(Permission::ManageCatalog)?;
    Ok(Json(state.db.fields().update(&id, patch).await?))
}

/// Removes the field and strips its key from every product's attributes.
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageCatalog)?;
    state.db.fields().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
