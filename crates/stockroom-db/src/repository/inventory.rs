//! # Inventory Repository
//!
//! Read and patch access to admitted units. Records are only ever created
//! by [`AdmissionRepository::submit`](crate::repository::admission::AdmissionRepository::submit)
//! and are never deleted.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use stockroom_core::validation::validate_location;
use stockroom_core::{InventoryRecord, InventoryStatus};

pub(crate) const INVENTORY_COLUMNS: &str = "id, product_id, batch_id, barcode, cost_price_cents, \
     selling_price_cents, location, status, admitted_at, updated_at";

/// Optional filters for [`InventoryRepository::list`]; all set filters must match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryFilter {
    pub batch_id: Option<String>,
    pub product_id: Option<String>,
    pub status: Option<InventoryStatus>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InventoryPatch {
    pub status: Option<InventoryStatus>,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    pub async fn list_all(&self) -> DbResult<Vec<InventoryRecord>> {
        self.list(&InventoryFilter::default()).await
    }

    /// Records matching `filter`, in admission order.
    pub async fn list(&self, filter: &InventoryFilter) -> DbResult<Vec<InventoryRecord>> {
        debug!(?filter, "Listing inventory");

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM inventory WHERE 1 = 1",
            INVENTORY_COLUMNS
        ));

        if let Some(batch_id) = &filter.batch_id {
            query.push(" AND batch_id = ").push_bind(batch_id);
        }
        if let Some(product_id) = &filter.product_id {
            query.push(" AND product_id = ").push_bind(product_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY admitted_at, barcode");

        let records = query
            .build_query_as::<InventoryRecord>()
            .fetch_all(&self.pool)
            .await?;
        Ok(records)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<InventoryRecord>> {
        let sql = format!("SELECT {} FROM inventory WHERE id = ?1", INVENTORY_COLUMNS);
        Ok(sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<InventoryRecord>> {
        let sql = format!("SELECT {} FROM inventory WHERE barcode = ?1", INVENTORY_COLUMNS);
        Ok(sqlx::query_as::<_, InventoryRecord>(&sql)
            .bind(barcode.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Changes a unit's status and/or location.
    pub async fn update(&self, id: &str, patch: InventoryPatch) -> DbResult<InventoryRecord> {
        let mut record = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory record", id))?;

        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(location) = patch.location {
            record.location = validate_location(&location)?;
        }
        record.updated_at = Utc::now();

        debug!(id = %id, status = record.status.as_str(), "Updating inventory record");

        let result = sqlx::query(
            "UPDATE inventory SET status = ?2, location = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&record.id)
        .bind(record.status)
        .bind(&record.location)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Inventory record", id));
        }

        Ok(record)
    }
}
