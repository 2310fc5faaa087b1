//! # Batch Repository
//!
//! Purchase lots waiting to be scanned in. Creation assigns the next batch
//! number and its `BATCH<n>` base code in one statement, so concurrent
//! creates never share a number.
//!
//! ## Edit Rules
//! ```text
//! quantity edit ──► admitted units > new quantity? ──► QuantityBelowAdmitted
//!                          │ no
//!                          ▼
//!                  admitted flag recomputed in the same transaction
//!
//! delete ──► any inventory references it? ──► BatchHasInventory
//! ```

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, generate_id};
use stockroom_core::money::{deserialize_cents, deserialize_cents_opt};
use stockroom_core::validation::{validate_batch_quantity, validate_positive_price};
use stockroom_core::{AdmittedFlag, Batch, CoreError, FIRST_BATCH_NUMBER};

pub(crate) const BATCH_COLUMNS: &str = "id, number, base_code, product_id, cost_price_cents, \
     selling_price_cents, quantity, admitted, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewBatch {
    pub product_id: String,
    #[serde(deserialize_with = "deserialize_cents")]
    pub cost_price_cents: i64,
    #[serde(deserialize_with = "deserialize_cents")]
    pub selling_price_cents: i64,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchPatch {
    pub product_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_cents_opt")]
    pub cost_price_cents: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_cents_opt")]
    pub selling_price_cents: Option<i64>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
}

impl BatchRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BatchRepository { pool }
    }

    /// Newest batch first.
    pub async fn list_all(&self) -> DbResult<Vec<Batch>> {
        let sql = format!("SELECT {} FROM batches ORDER BY number DESC", BATCH_COLUMNS);
        Ok(sqlx::query_as::<_, Batch>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Batch>> {
        let mut conn = self.pool.acquire().await?;
        fetch_batch(&mut conn, id).await
    }

    /// Creates a batch with the next number and its base code.
    ///
    /// ## Errors
    /// - `CoreError::ProductNotFound` if the product does not exist
    /// - Validation errors for non-positive prices or out-of-range quantity
    pub async fn create(&self, input: NewBatch) -> DbResult<Batch> {
        validate_positive_price("cost_price", input.cost_price_cents)?;
        validate_positive_price("selling_price", input.selling_price_cents)?;
        validate_batch_quantity(input.quantity)?;

        let id = generate_id();
        let now = Utc::now();

        let mut tx = begin_write(&self.pool).await?;
        ensure_product(&mut tx, &input.product_id).await?;

        sqlx::query(
            "INSERT INTO batches (
                id, number, base_code, product_id, cost_price_cents, selling_price_cents,
                quantity, admitted, created_at, updated_at
            )
            SELECT ?1, n, 'BATCH' || n, ?2, ?3, ?4, ?5, 'no', ?6, ?6
            FROM (SELECT COALESCE(MAX(number), ?7) + 1 AS n FROM batches)",
        )
        .bind(&id)
        .bind(&input.product_id)
        .bind(input.cost_price_cents)
        .bind(input.selling_price_cents)
        .bind(input.quantity)
        .bind(now)
        .bind(FIRST_BATCH_NUMBER - 1)
        .execute(&mut *tx)
        .await?;

        let batch = fetch_batch(&mut tx, &id)
            .await?
            .ok_or_else(|| DbError::Internal(format!("batch {} vanished after insert", id)))?;

        tx.commit().await?;

        info!(
            id = %batch.id,
            base_code = %batch.base_code,
            quantity = batch.quantity,
            "Batch created"
        );
        Ok(batch)
    }

    /// Applies `patch`; the admitted flag follows the new quantity.
    pub async fn update(&self, id: &str, patch: BatchPatch) -> DbResult<Batch> {
        debug!(id = %id, "Updating batch");

        let mut tx = begin_write(&self.pool).await?;
        let mut batch = fetch_batch(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Batch", id))?;

        if let Some(product_id) = patch.product_id {
            ensure_product(&mut tx, &product_id).await?;
            batch.product_id = product_id;
        }
        if let Some(cost) = patch.cost_price_cents {
            validate_positive_price("cost_price", cost)?;
            batch.cost_price_cents = cost;
        }
        if let Some(price) = patch.selling_price_cents {
            validate_positive_price("selling_price", price)?;
            batch.selling_price_cents = price;
        }

        let admitted = admitted_count(&mut tx, id).await?;
        if let Some(quantity) = patch.quantity {
            validate_batch_quantity(quantity)?;
            if quantity < admitted {
                return Err(CoreError::QuantityBelowAdmitted {
                    batch_id: id.to_string(),
                    admitted,
                    requested: quantity,
                }
                .into());
            }
            batch.quantity = quantity;
        }
        batch.admitted = AdmittedFlag::for_count(admitted, batch.quantity);
        batch.updated_at = Utc::now();

        sqlx::query(
            "UPDATE batches SET
                product_id = ?2, cost_price_cents = ?3, selling_price_cents = ?4,
                quantity = ?5, admitted = ?6, updated_at = ?7
             WHERE id = ?1",
        )
        .bind(&batch.id)
        .bind(&batch.product_id)
        .bind(batch.cost_price_cents)
        .bind(batch.selling_price_cents)
        .bind(batch.quantity)
        .bind(batch.admitted)
        .bind(batch.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(batch)
    }

    /// Deletes a batch that has no inventory yet.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let records = admitted_count(&mut tx, id).await?;
        if records > 0 {
            return Err(CoreError::BatchHasInventory {
                batch_id: id.to_string(),
                records,
            }
            .into());
        }

        let result = sqlx::query("DELETE FROM batches WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Batch", id));
        }

        tx.commit().await?;
        info!(id = %id, "Batch deleted");
        Ok(())
    }

    /// Inventory records referencing the batch.
    pub async fn admitted_count(&self, id: &str) -> DbResult<i64> {
        let mut conn = self.pool.acquire().await?;
        admitted_count(&mut conn, id).await
    }
}

pub(crate) async fn fetch_batch(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Batch>> {
    let sql = format!("SELECT {} FROM batches WHERE id = ?1", BATCH_COLUMNS);
    Ok(sqlx::query_as::<_, Batch>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?)
}

pub(crate) async fn admitted_count(conn: &mut SqliteConnection, batch_id: &str) -> DbResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory WHERE batch_id = ?1")
        .bind(batch_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

async fn ensure_product(conn: &mut SqliteConnection, product_id: &str) -> DbResult<()> {
    let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_optional(conn)
        .await?;

    if exists.is_none() {
        return Err(CoreError::ProductNotFound(product_id.to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_numbers_are_sequential() {
        let db = test_support::db().await;
        let product = test_support::product(&db, "Linen Shirt").await;

        let first = test_support::batch_for(&db, &product.id, 2).await;
        let second = test_support::batch_for(&db, &product.id, 5).await;

        assert_eq!(first.number, FIRST_BATCH_NUMBER);
        assert_eq!(first.base_code, "BATCH1001");
        assert_eq!(second.number, FIRST_BATCH_NUMBER + 1);
        assert_eq!(second.base_code, "BATCH1002");
        assert_eq!(first.admitted, AdmittedFlag::No);

        let listed = db.batches().list_all().await.unwrap();
        assert_eq!(listed[0].id, second.id);
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let db = test_support::db().await;
        let product = test_support::product(&db, "Linen Shirt").await;

        let missing_product = db
            .batches()
            .create(NewBatch {
                product_id: "ghost".to_string(),
                cost_price_cents: 100,
                selling_price_cents: 200,
                quantity: 1,
            })
            .await;
        assert!(matches!(
            missing_product,
            Err(DbError::Core(CoreError::ProductNotFound(_)))
        ));

        let zero_qty = db
            .batches()
            .create(NewBatch {
                product_id: product.id.clone(),
                cost_price_cents: 100,
                selling_price_cents: 200,
                quantity: 0,
            })
            .await;
        assert!(zero_qty.is_err());

        let free = db
            .batches()
            .create(NewBatch {
                product_id: product.id,
                cost_price_cents: 0,
                selling_price_cents: 200,
                quantity: 1,
            })
            .await;
        assert!(free.is_err());
    }

    #[tokio::test]
    async fn test_quantity_cannot_drop_below_admitted() {
        let db = test_support::db().await;
        let batch = test_support::batch(&db, 3).await;

        db.admission().submit(&batch.id, "BATCH1001-01").await.unwrap();
        db.admission().submit(&batch.id, "BATCH1001-02").await.unwrap();

        let err = db
            .batches()
            .update(
                &batch.id,
                BatchPatch {
                    quantity: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::QuantityBelowAdmitted { admitted: 2, requested: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_shrinking_to_admitted_count_flips_flag() {
        let db = test_support::db().await;
        let batch = test_support::batch(&db, 3).await;

        db.admission().submit(&batch.id, "BATCH1001-01").await.unwrap();
        db.admission().submit(&batch.id, "BATCH1001-02").await.unwrap();

        let shrunk = db
            .batches()
            .update(
                &batch.id,
                BatchPatch {
                    quantity: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(shrunk.admitted, AdmittedFlag::Yes);

        let grown = db
            .batches()
            .update(
                &batch.id,
                BatchPatch {
                    quantity: Some(4),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(grown.admitted, AdmittedFlag::No);

        let stored = db.batches().get_by_id(&batch.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 4);
        assert_eq!(stored.admitted, AdmittedFlag::No);
    }

    #[tokio::test]
    async fn test_delete_rules() {
        let db = test_support::db().await;
        let product = test_support::product(&db, "Linen Shirt").await;
        let empty = test_support::batch_for(&db, &product.id, 2).await;
        let started = test_support::batch_for(&db, &product.id, 2).await;

        db.admission().submit(&started.id, "BATCH1002-01").await.unwrap();

        let err = db.batches().delete(&started.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::BatchHasInventory { records: 1, .. })
        ));

        db.batches().delete(&empty.id).await.unwrap();
        assert!(db.batches().get_by_id(&empty.id).await.unwrap().is_none());
        assert!(matches!(
            db.batches().delete(&empty.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_creates_and_edits_wait_their_turn() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("stockroom.db")).max_connections(4))
            .await
            .unwrap();
        let product = test_support::product(&db, "Linen Shirt").await;
        let target = test_support::batch_for(&db, &product.id, 2).await;

        let mut handles = Vec::new();
        for k in 0..16 {
            let db = db.clone();
            let product_id = product.id.clone();
            let target_id = target.id.clone();
            handles.push(tokio::spawn(async move {
                db.batches()
                    .create(NewBatch {
                        product_id,
                        cost_price_cents: 800,
                        selling_price_cents: 1500,
                        quantity: 3,
                    })
                    .await?;
                db.batches()
                    .update(
                        &target_id,
                        BatchPatch {
                            quantity: Some(2 + k),
                            ..Default::default()
                        },
                    )
                    .await
                    .map(|_| ())
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let batches = db.batches().list_all().await.unwrap();
        assert_eq!(batches.len(), 17);
        let mut numbers: Vec<i64> = batches.iter().map(|b| b.number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        assert_eq!(numbers.len(), 17);
        assert_eq!(numbers.last().copied(), Some(FIRST_BATCH_NUMBER + 16));
        db.close().await;
    }
}
