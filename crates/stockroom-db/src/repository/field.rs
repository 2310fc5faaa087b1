//! # Field Repository
//!
//! Custom attribute definitions. A field's name and type are fixed once
//! created, since stored product values depend on both; options and the
//! required flag may change.

use chrono::Utc;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::{begin_write, generate_id};
use stockroom_core::validation::validate_field_definition;
use stockroom_core::{Field, FieldType, ValidationError};

const FIELD_COLUMNS: &str = "id, name, field_type, options, required, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FieldPatch {
    pub options: Option<Vec<String>>,
    pub required: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct FieldRepository {
    pool: SqlitePool,
}

impl FieldRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FieldRepository { pool }
    }

    pub async fn list_all(&self) -> DbResult<Vec<Field>> {
        let sql = format!("SELECT {} FROM fields ORDER BY name", FIELD_COLUMNS);
        Ok(sqlx::query_as::<_, Field>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Field>> {
        let sql = format!("SELECT {} FROM fields WHERE id = ?1", FIELD_COLUMNS);
        Ok(sqlx::query_as::<_, Field>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn create(&self, input: NewField) -> DbResult<Field> {
        let name = validate_field_definition(&input.name, input.field_type, &input.options)?;
        check_key_charset(&name)?;

        let now = Utc::now();
        let field = Field {
            id: generate_id(),
            name,
            field_type: input.field_type,
            options: input.options.iter().map(|o| o.trim().to_string()).collect(),
            required: input.required,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %field.id, name = %field.name, "Inserting field");

        sqlx::query(
            "INSERT INTO fields (id, name, field_type, options, required, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&field.id)
        .bind(&field.name)
        .bind(field.field_type)
        .bind(Json(&field.options))
        .bind(field.required)
        .bind(field.created_at)
        .bind(field.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(field.name.clone()))?;

        Ok(field)
    }

    pub async fn update(&self, id: &str, patch: FieldPatch) -> DbResult<Field> {
        debug!(id = %id, "Updating field");

        let mut field = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Field", id))?;

        if let Some(options) = patch.options {
            field.options = options.iter().map(|o| o.trim().to_string()).collect();
        }
        if let Some(required) = patch.required {
            field.required = required;
        }
        validate_field_definition(&field.name, field.field_type, &field.options)?;
        field.updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE fields SET options = ?2, required = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&field.id)
        .bind(Json(&field.options))
        .bind(field.required)
        .bind(field.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Field", id));
        }

        Ok(field)
    }

    /// Deletes the field and strips its key from every product's attributes.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut tx = begin_write(&self.pool).await?;

        let name: String = sqlx::query_scalar("SELECT name FROM fields WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Field", id))?;

        let stripped = sqlx::query(
            "UPDATE products SET attributes = json_remove(attributes, ?1)
             WHERE json_type(attributes, ?1) IS NOT NULL",
        )
        .bind(json_path(&name))
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM fields WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            field = %name,
            products = stripped.rows_affected(),
            "Field deleted"
        );
        Ok(())
    }
}

/// Field names become JSON object keys and path segments.
fn check_key_charset(name: &str) -> DbResult<()> {
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        return Err(ValidationError::invalid(
            "name",
            "must contain only letters, numbers, spaces, hyphens, and underscores",
        )
        .into());
    }
    Ok(())
}

fn json_path(key: &str) -> String {
    format!("$.\"{}\"", key)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::repository::product::NewProduct;
    use crate::repository::test_support;

    fn color() -> NewField {
        NewField {
            name: "color".to_string(),
            field_type: FieldType::Text,
            options: vec![],
            required: false,
        }
    }

    #[tokio::test]
    async fn test_create_list_update() {
        let db = test_support::db().await;
        let size = db
            .fields()
            .create(NewField {
                name: "size".to_string(),
                field_type: FieldType::Select,
                options: vec![" S ".into(), "M".into()],
                required: false,
            })
            .await
            .unwrap();
        assert_eq!(size.options, vec!["S".to_string(), "M".to_string()]);

        db.fields().create(color()).await.unwrap();
        let names: Vec<_> = db
            .fields()
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["color", "size"]);

        let updated = db
            .fields()
            .update(
                &size.id,
                FieldPatch {
                    options: Some(vec!["S".into(), "M".into(), "L".into()]),
                    required: Some(true),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.options.len(), 3);
        assert!(updated.required);

        let stored = db.fields().get_by_id(&size.id).await.unwrap().unwrap();
        assert_eq!(stored.options.len(), 3);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_support::db().await;
        db.fields().create(color()).await.unwrap();
        let err = db.fields().create(color()).await.unwrap_err();
        assert!(err.is_unique_violation_on("fields.name"));
    }

    #[tokio::test]
    async fn test_select_without_options_rejected() {
        let db = test_support::db().await;
        let size = db
            .fields()
            .create(NewField {
                name: "size".to_string(),
                field_type: FieldType::Select,
                options: vec!["S".into()],
                required: false,
            })
            .await
            .unwrap();

        let err = db
            .fields()
            .update(
                &size.id,
                FieldPatch {
                    options: Some(vec![]),
                    required: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(_)));
    }

    #[tokio::test]
    async fn test_delete_strips_product_attributes() {
        let db = test_support::db().await;
        let field = db.fields().create(color()).await.unwrap();

        let mut attributes = BTreeMap::new();
        attributes.insert("color".to_string(), json!("navy"));
        let product = db
            .products()
            .create(NewProduct {
                name: "Cap".to_string(),
                sku: None,
                description: None,
                category_id: None,
                selling_price_cents: 1200,
                attributes,
            })
            .await
            .unwrap();

        db.fields().delete(&field.id).await.unwrap();

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert!(product.attributes.is_empty());
        assert!(db.fields().get_by_id(&field.id).await.unwrap().is_none());

        assert!(matches!(
            db.fields().delete(&field.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_name_charset() {
        let db = test_support::db().await;
        let mut bad = color();
        bad.name = "co\"lor".to_string();
        assert!(db.fields().create(bad).await.is_err());
    }
}
