//! Public read model for the shop window. No authentication.

use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::AppState;
use stockroom_core::StorefrontProduct;

/// Active products with their available unit count and price.
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<StorefrontProduct>>, ApiError> {
    Ok(Json(state.db.products().storefront().await?))
}
