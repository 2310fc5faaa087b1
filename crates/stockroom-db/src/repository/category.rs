//! # Category Repository
//!
//! Categories are stored flat with a parent pointer. Structural changes
//! (insert, move, delete) load the rows into a [`CategoryTree`], let it
//! check the change, then write the result in the same transaction.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, generate_id};
use stockroom_core::category_tree::{CategoryNode, CategoryTree};
use stockroom_core::validation::validate_name;
use stockroom_core::Category;

const CATEGORY_COLUMNS: &str = "id, name, parent_id, sort_order, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

/// Rename / reorder. Re-parenting goes through [`CategoryRepository::move_to`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub sort_order: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn list_all(&self) -> DbResult<Vec<Category>> {
        let mut conn = self.pool.acquire().await?;
        load_all(&mut conn).await
    }

    /// The whole hierarchy, nested.
    pub async fn tree(&self) -> DbResult<Vec<CategoryNode>> {
        let categories = self.list_all().await?;
        Ok(CategoryTree::from_categories(categories)?.nested())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let sql = format!("SELECT {} FROM categories WHERE id = ?1", CATEGORY_COLUMNS);
        Ok(sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn create(&self, input: NewCategory) -> DbResult<Category> {
        let now = Utc::now();
        let category = Category {
            id: generate_id(),
            name: validate_name("name", &input.name, 100)?,
            parent_id: input.parent_id,
            sort_order: input.sort_order,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.id, parent = ?category.parent_id, "Inserting category");

        let mut tx = begin_write(&self.pool).await?;
        let mut tree = CategoryTree::from_categories(load_all(&mut tx).await?)?;
        tree.insert(category.clone())?;

        sqlx::query(
            "INSERT INTO categories (id, name, parent_id, sort_order, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.parent_id)
        .bind(category.sort_order)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(category)
    }

    pub async fn update(&self, id: &str, patch: CategoryPatch) -> DbResult<Category> {
        let mut category = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))?;

        if let Some(name) = patch.name {
            category.name = validate_name("name", &name, 100)?;
        }
        if let Some(sort_order) = patch.sort_order {
            category.sort_order = sort_order;
        }
        category.updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE categories SET name = ?2, sort_order = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.sort_order)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(category)
    }

    /// Re-parents a category (and its subtree). `None` makes it a root.
    pub async fn move_to(&self, id: &str, new_parent: Option<&str>) -> DbResult<Category> {
        debug!(id = %id, parent = ?new_parent, "Moving category");

        let mut tx = begin_write(&self.pool).await?;
        let mut tree = CategoryTree::from_categories(load_all(&mut tx).await?)?;
        if tree.get(id).is_none() {
            return Err(DbError::not_found("Category", id));
        }
        tree.move_to(id, new_parent)?;

        let now = Utc::now();
        sqlx::query("UPDATE categories SET parent_id = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(new_parent)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let mut moved = tree
            .get(id)
            .cloned()
            .ok_or_else(|| DbError::not_found("Category", id))?;
        moved.updated_at = now;
        Ok(moved)
    }

    /// Deletes the category and everything below it.
    ///
    /// Products filed under any removed category are left uncategorized.
    ///
    /// ## Returns
    /// Ids of the removed categories.
    pub async fn delete(&self, id: &str) -> DbResult<Vec<String>> {
        let mut tx = begin_write(&self.pool).await?;
        let mut tree = CategoryTree::from_categories(load_all(&mut tx).await?)?;
        if tree.get(id).is_none() {
            return Err(DbError::not_found("Category", id));
        }
        let removed = tree.remove(id)?;

        let now = Utc::now();
        for gone in &removed {
            sqlx::query("UPDATE products SET category_id = NULL, updated_at = ?2 WHERE category_id = ?1")
                .bind(gone)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM categories WHERE id = ?1")
                .bind(gone)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(id = %id, removed = removed.len(), "Category subtree deleted");
        Ok(removed)
    }
}

async fn load_all(conn: &mut SqliteConnection) -> DbResult<Vec<Category>> {
    let sql = format!(
        "SELECT {} FROM categories ORDER BY sort_order, name",
        CATEGORY_COLUMNS
    );
    Ok(sqlx::query_as::<_, Category>(&sql).fetch_all(conn).await?)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::repository::product::NewProduct;
    use crate::repository::test_support;
    use crate::{Database, DbConfig};
    use stockroom_core::CoreError;

    async fn add(repo: &CategoryRepository, name: &str, parent: Option<&str>) -> Category {
        repo.create(NewCategory {
            name: name.to_string(),
            parent_id: parent.map(str::to_string),
            sort_order: 0,
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_nested_tree() {
        let db = test_support::db().await;
        let repo = db.categories();
        let clothing = add(&repo, "Clothing", None).await;
        let men = add(&repo, "Men", Some(&clothing.id)).await;
        add(&repo, "Shirts", Some(&men.id)).await;
        add(&repo, "Home", None).await;

        let tree = repo.tree().await.unwrap();
        assert_eq!(tree.len(), 2);
        let clothing_node = tree.iter().find(|n| n.category.name == "Clothing").unwrap();
        assert_eq!(clothing_node.children[0].children[0].category.name, "Shirts");
    }

    #[tokio::test]
    async fn test_unknown_parent_rejected() {
        let db = test_support::db().await;
        let err = db
            .categories()
            .create(NewCategory {
                name: "Orphan".to_string(),
                parent_id: Some("ghost".to_string()),
                sort_order: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CategoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_move_rejects_cycle_and_persists_valid_move() {
        let db = test_support::db().await;
        let repo = db.categories();
        let clothing = add(&repo, "Clothing", None).await;
        let men = add(&repo, "Men", Some(&clothing.id)).await;
        let home = add(&repo, "Home", None).await;

        let err = repo.move_to(&clothing.id, Some(&men.id)).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CategoryCycle { .. })));

        let moved = repo.move_to(&men.id, Some(&home.id)).await.unwrap();
        assert_eq!(moved.parent_id.as_deref(), Some(home.id.as_str()));

        let stored = repo.get_by_id(&men.id).await.unwrap().unwrap();
        assert_eq!(stored.parent_id.as_deref(), Some(home.id.as_str()));
    }

    #[tokio::test]
    async fn test_delete_removes_subtree_and_uncategorizes_products() {
        let db = test_support::db().await;
        let repo = db.categories();
        let clothing = add(&repo, "Clothing", None).await;
        let men = add(&repo, "Men", Some(&clothing.id)).await;
        let shirts = add(&repo, "Shirts", Some(&men.id)).await;
        let home = add(&repo, "Home", None).await;

        let product = db
            .products()
            .create(NewProduct {
                name: "Oxford Shirt".to_string(),
                sku: None,
                description: None,
                category_id: Some(shirts.id.clone()),
                selling_price_cents: 5000,
                attributes: BTreeMap::new(),
            })
            .await
            .unwrap();

        let removed = repo.delete(&clothing.id).await.unwrap();
        assert_eq!(removed.len(), 3);

        let remaining = repo.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, home.id);

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.category_id, None);

        assert!(matches!(
            repo.delete(&clothing.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_rename() {
        let db = test_support::db().await;
        let repo = db.categories();
        let c = add(&repo, "Clothng", None).await;
        let renamed = repo
            .update(
                &c.id,
                CategoryPatch {
                    name: Some("Clothing".to_string()),
                    sort_order: Some(3),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Clothing");
        assert_eq!(renamed.sort_order, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_inserts_and_moves() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("stockroom.db")).max_connections(4))
            .await
            .unwrap();
        let repo = db.categories();
        let clothing = add(&repo, "Clothing", None).await;
        let home = add(&repo, "Home", None).await;

        let mut handles = Vec::new();
        for k in 0..12 {
            let repo = db.categories();
            let parent = if k % 2 == 0 { clothing.id.clone() } else { home.id.clone() };
            handles.push(tokio::spawn(async move {
                let child = repo
                    .create(NewCategory {
                        name: format!("Shelf {}", k),
                        parent_id: Some(parent),
                        sort_order: k,
                    })
                    .await?;
                repo.move_to(&child.id, None).await
            }));
        }

        for handle in handles {
            let moved = handle.await.unwrap().unwrap();
            assert_eq!(moved.parent_id, None);
        }
        assert_eq!(repo.list_all().await.unwrap().len(), 14);
        db.close().await;
    }
}
