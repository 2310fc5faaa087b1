use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use super::{ApiJson, ApiQuery};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use stockroom_core::{Permission, Product};
use stockroom_db::{NewProduct, ProductPatch};

const DEFAULT_SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

/// All products, or a name/SKU search with `?q=`.
pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<Vec<Product>>, ApiError> {
    user.require(Permission::ViewInventory)?;

    let products = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => {
            let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
            state.db.products().search(q, limit).await?
        }
        _ => state.db.products().list_all().await?,
    };
    Ok(Json(products))
}

pub async fn get(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    user.require(Permission::ViewInventory)?;
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    user.require(Permission::ManageCatalog)?;
    let product = state.db.products().create(input).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    user.require(Permission::ManageCatalog)?;
    Ok(Json(state.db.products().update(&id, patch).await?))
}

/// Deactivates the product; its batches and inventory keep pointing at it.
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageCatalog)?;
    state.db.products().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
