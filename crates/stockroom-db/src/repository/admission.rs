//! # Admission Driver
//!
//! Runs the [`AdmissionSession`] rules against SQLite, one scan per
//! transaction.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(batch_id, code)                                                 │
//! │       │                                                                 │
//! │       ├── code blank? ──────────────────────────► EmptyCode             │
//! │       ▼                                                                 │
//! │  BEGIN IMMEDIATE                  (write lock first: scans serialize)   │
//! │  UPDATE batches SET updated_at                                          │
//! │       ├── 0 rows ───────────────────────────────► BatchNotFound         │
//! │       ▼                                                                 │
//! │  load batch, COUNT(inventory) → AdmissionSession                        │
//! │  barcode already on any record? → session.evaluate(code, taken)         │
//! │       ├── rejected ─────────────────────────────► ROLLBACK, error       │
//! │       ▼                                                                 │
//! │  resolve location (oldest active warehouse, else default)               │
//! │  INSERT … SELECT … WHERE count < quantity                               │
//! │       ├── 0 rows ───────────────────────────────► BatchComplete         │
//! │       ├── UNIQUE(barcode) ──────────────────────► DuplicateBarcode      │
//! │       ▼                                                                 │
//! │  count == quantity? → UPDATE batches SET admitted = 'yes'               │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The record insert and the batch flag flip commit together, so a batch is
//! never left with every unit scanned but `admitted = no`.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::batch::{admitted_count, fetch_batch};
use crate::repository::{begin_write, generate_id};
use crate::repository::inventory::INVENTORY_COLUMNS;
use crate::repository::store::warehouse_location;
use stockroom_core::admission::normalize_code;
use stockroom_core::{
    AdmissionError, AdmissionPhase, AdmissionSession, AdmissionStatus, CoreError, InventoryRecord,
};

/// Result of an accepted scan.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionOutcome {
    /// The inventory record just created.
    pub record: InventoryRecord,
    /// Session state after the scan.
    pub status: AdmissionStatus,
}

#[derive(Debug, Clone)]
pub struct AdmissionRepository {
    pool: SqlitePool,
    default_location: String,
}

impl AdmissionRepository {
    pub fn new(pool: SqlitePool, default_location: String) -> Self {
        AdmissionRepository {
            pool,
            default_location,
        }
    }

    /// Progress of a batch for the scanning screen.
    pub async fn status(&self, batch_id: &str) -> DbResult<AdmissionStatus> {
        let mut conn = self.pool.acquire().await?;

        let batch = fetch_batch(&mut conn, batch_id)
            .await?
            .ok_or_else(|| CoreError::BatchNotFound(batch_id.to_string()))?;
        let count = admitted_count(&mut conn, batch_id).await?;

        Ok(AdmissionSession::new(batch, count)?.status())
    }

    /// Admits one scanned unit into inventory.
    ///
    /// ## Errors
    /// - `CoreError::AdmissionRejected(..)` for an empty, duplicate, or
    ///   foreign code, or a batch that is already complete
    /// - `CoreError::BatchNotFound` if the batch id is unknown
    /// - Database errors; nothing is written in that case
    pub async fn submit(&self, batch_id: &str, raw_code: &str) -> DbResult<AdmissionOutcome> {
        let code = normalize_code(raw_code).map_err(CoreError::from)?;

        let mut tx = begin_write(&self.pool).await?;
        let now = Utc::now();

        let touched = sqlx::query("UPDATE batches SET updated_at = ?2 WHERE id = ?1")
            .bind(batch_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(CoreError::BatchNotFound(batch_id.to_string()).into());
        }

        let batch = fetch_batch(&mut tx, batch_id)
            .await?
            .ok_or_else(|| CoreError::BatchNotFound(batch_id.to_string()))?;
        let count = admitted_count(&mut tx, batch_id).await?;
        let mut session = AdmissionSession::new(batch, count)?;

        let taken: Option<i64> = sqlx::query_scalar("SELECT 1 FROM inventory WHERE barcode = ?1")
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?;

        if let Err(rejection) = session.evaluate(code, taken.is_some()) {
            warn!(
                batch = %session.batch().base_code,
                code = %code,
                reason = %rejection,
                "Admission rejected"
            );
            return Err(CoreError::from(rejection).into());
        }

        let location = match warehouse_location(&mut tx).await {
            Ok(Some(name)) => name,
            Ok(None) => {
                debug!(location = %self.default_location, "No active warehouse; using default location");
                self.default_location.clone()
            }
            Err(e) => {
                warn!(error = %e, "Warehouse lookup failed; using default location");
                self.default_location.clone()
            }
        };

        let record_id = generate_id();
        let inserted = sqlx::query(
            "INSERT INTO inventory (
                id, product_id, batch_id, barcode, cost_price_cents, selling_price_cents,
                location, status, admitted_at, updated_at
            )
            SELECT ?1, b.product_id, b.id, ?2, b.cost_price_cents, b.selling_price_cents,
                   ?3, 'available', ?4, ?4
            FROM batches b
            WHERE b.id = ?5
              AND (SELECT COUNT(*) FROM inventory WHERE batch_id = b.id) < b.quantity",
        )
        .bind(&record_id)
        .bind(code)
        .bind(&location)
        .bind(now)
        .bind(batch_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            let err = DbError::from(e);
            if err.is_unique_violation_on("inventory.barcode") {
                DbError::from(CoreError::from(AdmissionError::DuplicateBarcode {
                    code: code.to_string(),
                }))
            } else {
                err
            }
        })?;

        if inserted.rows_affected() == 0 {
            return Err(CoreError::from(AdmissionError::BatchComplete {
                base_code: session.batch().base_code.clone(),
            })
            .into());
        }

        let phase = session.record_admitted().map_err(CoreError::from)?;
        if phase == AdmissionPhase::Terminal {
            sqlx::query("UPDATE batches SET admitted = 'yes' WHERE id = ?1")
                .bind(batch_id)
                .execute(&mut *tx)
                .await?;
        }

        let sql = format!("SELECT {} FROM inventory WHERE id = ?1", INVENTORY_COLUMNS);
        let record = sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(&record_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            batch = %session.batch().base_code,
            barcode = %record.barcode,
            admitted = session.admitted_count(),
            quantity = session.batch().quantity,
            "Unit admitted"
        );
        if phase == AdmissionPhase::Terminal {
            info!(batch = %session.batch().base_code, "Batch fully admitted");
        }

        Ok(AdmissionOutcome {
            record,
            status: session.status(),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
