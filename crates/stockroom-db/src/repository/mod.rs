//! # Repository Module
//!
//! One repository per collection, plus the admission driver.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │  db.batches().update(&id, patch)                               │
//! │       ▼                                                                 │
//! │  BatchRepository                                                       │
//! │  ├── list_all / get_by_id                                              │
//! │  ├── create(NewBatch)         → assigns id, number, base_code          │
//! │  ├── update(id, BatchPatch)   → None fields left unchanged             │
//! │  └── delete(id)               → NotFound if missing                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Patch structs deserialize straight from request bodies. For nullable
//! columns a patch field is `Option<Option<T>>`: absent leaves the column,
//! `null` clears it.
//!
//! Read-modify-write paths open their transaction with `begin_write`.
//! A deferred transaction that reads first cannot upgrade to a writer once
//! another connection has committed (SQLITE_BUSY, no busy wait), so these
//! paths take the write lock up front and queue on `busy_timeout` instead.

use serde::{Deserialize, Deserializer};
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::error::DbResult;

pub mod admission;
pub mod batch;
pub mod category;
pub mod field;
pub mod inventory;
pub mod product;
pub mod store;
pub mod user;

/// Keeps `null` distinct from an absent key. Use with `#[serde(default)]`.
pub fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Starts a `BEGIN IMMEDIATE` transaction holding SQLite's write lock.
pub(crate) async fn begin_write(pool: &SqlitePool) -> DbResult<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Fresh UUID v4 for a new row.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::BTreeMap;

    use stockroom_core::{Batch, Product};

    use super::batch::NewBatch;
    use super::product::NewProduct;
    use crate::{Database, DbConfig};

    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn product(db: &Database, name: &str) -> Product {
        db.products()
            .create(NewProduct {
                name: name.to_string(),
                sku: None,
                description: None,
                category_id: None,
                selling_price_cents: 1500,
                attributes: BTreeMap::new(),
            })
            .await
            .unwrap()
    }

    pub async fn batch(db: &Database, quantity: i64) -> Batch {
        let product = product(db, "Linen Shirt").await;
        batch_for(db, &product.id, quantity).await
    }

    pub async fn batch_for(db: &Database, product_id: &str, quantity: i64) -> Batch {
        db.batches()
            .create(NewBatch {
                product_id: product_id.to_string(),
                cost_price_cents: 800,
                selling_price_cents: 1500,
                quantity,
            })
            .await
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        address: Option<Option<String>>,
    }

    #[test]
    fn test_double_option_distinguishes_null_and_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.address, None);

        let null: Patch = serde_json::from_str(r#"{"address": null}"#).unwrap();
        assert_eq!(null.address, Some(None));

        let set: Patch = serde_json::from_str(r#"{"address": "Dock 4"}"#).unwrap();
        assert_eq!(set.address, Some(Some("Dock 4".to_string())));
    }
}
