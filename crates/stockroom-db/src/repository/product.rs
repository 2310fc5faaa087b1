//! # Product Repository
//!
//! Catalog CRUD, name/SKU search, and the storefront read model.
//!
//! Attribute values are checked against the custom field definitions inside
//! the same transaction that writes the product.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, double_option, generate_id};
use stockroom_core::validation::{
    validate_attributes, validate_price_cents, validate_product_name, validate_search_query,
    validate_sku,
};
use stockroom_core::money::{deserialize_cents, deserialize_cents_opt};
use stockroom_core::{Field, Product, StorefrontProduct};

const PRODUCT_COLUMNS: &str = "id, sku, name, description, category_id, selling_price_cents, \
     attributes, is_active, created_at, updated_at";

/// Input for a new product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(deserialize_with = "deserialize_cents")]
    pub selling_price_cents: i64,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

/// Partial product update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub sku: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_cents_opt")]
    pub selling_price_cents: Option<i64>,
    /// Replaces the whole attribute map.
    pub attributes: Option<BTreeMap<String, serde_json::Value>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Every product, active or not, by name.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY name, id", PRODUCT_COLUMNS);
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Active products whose name or SKU contains `query` (case-insensitive).
    ///
    /// An empty query lists active products.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;

        debug!(query = %query, limit = %limit, "Searching products");

        let pattern = format!("%{}%", escape_like(&query));
        let sql = format!(
            "SELECT {} FROM products
             WHERE is_active = 1
               AND (name LIKE ?1 ESCAPE '\\' OR sku LIKE ?1 ESCAPE '\\')
             ORDER BY name, id
             LIMIT ?2",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Inserts a product after validating it.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the SKU is taken
    /// - `ForeignKeyViolation` if `category_id` does not exist
    pub async fn create(&self, input: NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            sku: normalize_sku(input.sku)?,
            name: validate_product_name(&input.name)?,
            description: input.description,
            category_id: input.category_id,
            selling_price_cents: input.selling_price_cents,
            attributes: input.attributes,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        validate_price_cents(product.selling_price_cents)?;

        debug!(id = %product.id, name = %product.name, "Inserting product");

        let mut tx = begin_write(&self.pool).await?;
        let fields = load_fields(&mut tx).await?;
        validate_attributes(&product.attributes, &fields)?;

        sqlx::query(
            "INSERT INTO products (
                id, sku, name, description, category_id, selling_price_cents,
                attributes, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(product.selling_price_cents)
        .bind(Json(&product.attributes))
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| sku_conflict(e, &product.sku))?;

        tx.commit().await?;
        Ok(product)
    }

    /// Applies `patch` to the product and returns the stored result.
    pub async fn update(&self, id: &str, patch: ProductPatch) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let mut tx = begin_write(&self.pool).await?;

        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let mut product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if let Some(name) = patch.name {
            product.name = validate_product_name(&name)?;
        }
        if let Some(sku) = patch.sku {
            product.sku = normalize_sku(sku)?;
        }
        if let Some(description) = patch.description {
            product.description = description;
        }
        if let Some(category_id) = patch.category_id {
            product.category_id = category_id;
        }
        if let Some(price) = patch.selling_price_cents {
            validate_price_cents(price)?;
            product.selling_price_cents = price;
        }
        if let Some(attributes) = patch.attributes {
            product.attributes = attributes;
        }
        if let Some(is_active) = patch.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();

        let fields = load_fields(&mut tx).await?;
        validate_attributes(&product.attributes, &fields)?;

        sqlx::query(
            "UPDATE products SET
                sku = ?2, name = ?3, description = ?4, category_id = ?5,
                selling_price_cents = ?6, attributes = ?7, is_active = ?8, updated_at = ?9
             WHERE id = ?1",
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.category_id)
        .bind(product.selling_price_cents)
        .bind(Json(&product.attributes))
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| sku_conflict(e, &product.sku))?;

        tx.commit().await?;
        Ok(product)
    }

    /// Soft-deletes a product. Batches and inventory keep referencing it.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Active products with available unit counts, for the public storefront.
    pub async fn storefront(&self) -> DbResult<Vec<StorefrontProduct>> {
        let listing = sqlx::query_as::<_, StorefrontProduct>(
            "SELECT
                p.id, p.name, p.description, p.category_id, p.attributes,
                COALESCE(MIN(i.selling_price_cents), p.selling_price_cents) AS price_cents,
                COUNT(i.id) AS available_units
             FROM products p
             LEFT JOIN inventory i ON i.product_id = p.id AND i.status = 'available'
             WHERE p.is_active = 1
             GROUP BY p.id
             ORDER BY p.name, p.id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(listing
            .into_iter()
            .map(StorefrontProduct::with_display_price)
            .collect())
    }

    /// Counts active products (for diagnostics and the seeder).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

pub(crate) async fn load_fields(conn: &mut SqliteConnection) -> DbResult<Vec<Field>> {
    let fields = sqlx::query_as::<_, Field>(
        "SELECT id, name, field_type, options, required, created_at, updated_at
         FROM fields ORDER BY name",
    )
    .fetch_all(conn)
    .await?;
    Ok(fields)
}

fn normalize_sku(sku: Option<String>) -> DbResult<Option<String>> {
    match sku.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(sku) => {
            validate_sku(sku)?;
            Ok(Some(sku.to_string()))
        }
    }
}

fn sku_conflict(err: sqlx::Error, sku: &Option<String>) -> DbError {
    let err = DbError::from(err);
    match sku {
        Some(sku) if err.is_unique_violation_on("products.sku") => err.with_value(sku.clone()),
        _ => err,
    }
}

fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
