//! # Store Repository
//!
//! Warehouses, shops, and online channels. The oldest active warehouse
//! names the location of newly admitted units.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{double_option, generate_id};
use stockroom_core::validation::validate_name;
use stockroom_core::{Store, StoreType};

const STORE_COLUMNS: &str = "id, name, store_type, address, is_active, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewStore {
    pub name: String,
    pub store_type: StoreType,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorePatch {
    pub name: Option<String>,
    pub store_type: Option<StoreType>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct StoreRepository {
    pool: SqlitePool,
}

impl StoreRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StoreRepository { pool }
    }

    pub async fn list_all(&self) -> DbResult<Vec<Store>> {
        let sql = format!("SELECT {} FROM stores ORDER BY created_at, id", STORE_COLUMNS);
        Ok(sqlx::query_as::<_, Store>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Store>> {
        let sql = format!("SELECT {} FROM stores WHERE id = ?1", STORE_COLUMNS);
        Ok(sqlx::query_as::<_, Store>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn create(&self, input: NewStore) -> DbResult<Store> {
        let now = Utc::now();
        let store = Store {
            id: generate_id(),
            name: validate_name("name", &input.name, 100)?,
            store_type: input.store_type,
            address: input.address,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %store.id, name = %store.name, "Inserting store");

        sqlx::query(
            "INSERT INTO stores (id, name, store_type, address, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(store.store_type)
        .bind(&store.address)
        .bind(store.is_active)
        .bind(store.created_at)
        .bind(store.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(store)
    }

    pub async fn update(&self, id: &str, patch: StorePatch) -> DbResult<Store> {
        let mut store = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Store", id))?;

        if let Some(name) = patch.name {
            store.name = validate_name("name", &name, 100)?;
        }
        if let Some(store_type) = patch.store_type {
            store.store_type = store_type;
        }
        if let Some(address) = patch.address {
            store.address = address;
        }
        if let Some(is_active) = patch.is_active {
            store.is_active = is_active;
        }
        store.updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE stores SET name = ?2, store_type = ?3, address = ?4, is_active = ?5, updated_at = ?6
             WHERE id = ?1",
        )
        .bind(&store.id)
        .bind(&store.name)
        .bind(store.store_type)
        .bind(&store.address)
        .bind(store.is_active)
        .bind(store.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Store", id));
        }

        Ok(store)
    }

    /// Removes the store. Inventory keeps its location text.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stores WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Store", id));
        }

        Ok(())
    }

    /// Name of the oldest active warehouse, if any.
    pub async fn primary_warehouse(&self) -> DbResult<Option<String>> {
        let mut conn = self.pool.acquire().await?;
        warehouse_location(&mut conn).await
    }
}

pub(crate) async fn warehouse_location(conn: &mut SqliteConnection) -> DbResult<Option<String>> {
    let name = sqlx::query_scalar(
        "SELECT name FROM stores
         WHERE store_type = 'warehouse' AND is_active = 1
         ORDER BY created_at, id
         LIMIT 1",
    )
    .fetch_optional(conn)
    .await?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    fn store(name: &str, store_type: StoreType) -> NewStore {
        NewStore {
            name: name.to_string(),
            store_type,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_crud() {
        let db = test_support::db().await;
        let repo = db.stores();

        let shop = repo.create(store("High Street", StoreType::Retail)).await.unwrap();
        assert!(shop.is_active);

        let updated = repo
            .update(
                &shop.id,
                StorePatch {
                    address: Some(Some("12 High St".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.address.as_deref(), Some("12 High St"));
        assert_eq!(updated.store_type, StoreType::Retail);

        assert_eq!(repo.list_all().await.unwrap().len(), 1);
        repo.delete(&shop.id).await.unwrap();
        assert!(repo.list_all().await.unwrap().is_empty());
        assert!(matches!(repo.delete(&shop.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_primary_warehouse() {
        let db = test_support::db().await;
        let repo = db.stores();

        assert_eq!(repo.primary_warehouse().await.unwrap(), None);

        repo.create(store("Instagram Shop", StoreType::Online)).await.unwrap();
        assert_eq!(repo.primary_warehouse().await.unwrap(), None);

        let north = repo.create(store("North Depot", StoreType::Warehouse)).await.unwrap();
        repo.create(store("South Depot", StoreType::Warehouse)).await.unwrap();
        assert_eq!(repo.primary_warehouse().await.unwrap().as_deref(), Some("North Depot"));

        repo.update(
            &north.id,
            StorePatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(repo.primary_warehouse().await.unwrap().as_deref(), Some("South Depot"));
    }
}
