//! Batch administration and the scanning endpoints.
//!
//! Batch responses carry the purchase valuation next to the stored columns:
//! `total_cost_cents` (unit cost × quantity) and `markup_bps` (selling price
//! over cost, in basis points). Prices may be sent as cents or as decimal
//! strings (`"45.00"`).
//!
//! ```text
//! GET  /api/batches/{id}/admission           → AdmissionStatus
//! POST /api/batches/{id}/admission {code}    → 201 { record, status }
//!                                            → 409 DUPLICATE_BARCODE
//!                                            → 422 WRONG_BATCH
//!                                            → 400 VALIDATION_ERROR (empty code, unknown or
//!                                                                    complete batch)
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::ApiJson;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;
use stockroom_core::{AdmissionStatus, Batch, Money, Permission};
use stockroom_db::{AdmissionOutcome, BatchPatch, NewBatch};

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: Batch,
    pub total_cost_cents: Money,
    pub markup_bps: Option<i64>,
}

impl From<Batch> for BatchView {
    fn from(batch: Batch) -> Self {
        BatchView {
            total_cost_cents: batch.total_cost(),
            markup_bps: batch.markup_bps(),
            batch,
        }
    }
}

pub async fn list(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<BatchView>>, ApiError> {
    user.require(Permission::ManageBatches)?;
    let batches = state.db.batches().list_all().await?;
    Ok(Json(batches.into_iter().map(BatchView::from).collect()))
}

pub async fn get(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<BatchView>, ApiError> {
    user.require(Permission::ManageBatches)?;
    state
        .db
        .batches()
        .get_by_id(&id)
        .await?
        .map(|batch| Json(batch.into()))
        .ok_or_else(|| ApiError::not_found("Batch", &id))
}

pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(input): ApiJson<NewBatch>,
) -> Result<(StatusCode, Json<BatchView>), ApiError> {
    user.require(Permission::ManageBatches)?;
    let batch = state.db.batches().create(input).await?;
    Ok((StatusCode::CREATED, Json(batch.into())))
}

pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<BatchPatch>,
) -> Result<Json<BatchView>, ApiError> {
    user.require(Permission::ManageBatches)?;
    Ok(Json(state.db.batches().update(&id, patch).await?.into()))
}

pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageBatches)?;
    state.db.batches().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn admission_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdmissionStatus>, ApiError> {
    user.require(Permission::AdmitInventory)?;
    Ok(Json(state.db.admission().status(&id).await?))
}

/// Admits one scanned unit.
pub async fn admit(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ScanRequest>,
) -> Result<(StatusCode, Json<AdmissionOutcome>), ApiError> {
    user.require(Permission::AdmitInventory)?;
    let outcome = state.db.admission().submit(&id, &req.code).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
