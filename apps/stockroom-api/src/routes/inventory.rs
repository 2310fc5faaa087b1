use axum::extract::{Path, State};
use axum::Json;

use super::{ApiJson, ApiQuery};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use stockroom_core::{InventoryRecord, Permission};
use stockroom_db::{InventoryFilter, InventoryPatch};

/// `?batch_id=&product_id=&status=`; all given filters must match.
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<InventoryFilter>,
) -> Result<Json<Vec<InventoryRecord>>, ApiError> {
    user.require(Permission::ViewInventory)?;
    Ok(Json(state.db.inventory().list(&filter).await?))
}

pub async fn get(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InventoryRecord>, ApiError> {
    user.require(Permission::ViewInventory)?;
    state
        .db
        .inventory()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Inventory record", &id))
}

pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<InventoryPatch>,
) -> Result<Json<InventoryRecord>, ApiError> {
    user.require(Permission::UpdateInventoryStatus)?;
    Ok(Json(state.db.inventory().update(&id, patch).await?))
}
