//! # User Repository
//!
//! Back-office accounts. Passwords arrive here already hashed; hashing and
//! verification live with authentication in the HTTP service.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::generate_id;
use stockroom_core::validation::validate_username;
use stockroom_core::{Role, User};

const USER_COLUMNS: &str = "id, username, password_hash, role, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn list_all(&self) -> DbResult<Vec<User>> {
        let sql = format!("SELECT {} FROM users ORDER BY username", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?)
    }

    pub async fn create(&self, input: NewUser) -> DbResult<User> {
        let now = Utc::now();
        let user = User {
            id: generate_id(),
            username: validate_username(&input.username)?,
            password_hash: input.password_hash,
            role: input.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %user.id, username = %user.username, role = %user.role, "Inserting user");

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(user.username.clone()))?;

        Ok(user)
    }

    pub async fn update(&self, id: &str, patch: UserPatch) -> DbResult<User> {
        let mut user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))?;

        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        let result = sqlx::query(
            "UPDATE users SET password_hash = ?2, role = ?3, is_active = ?4, updated_at = ?5
             WHERE id = ?1",
        )
        .bind(&user.id)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(user)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support;

    fn staff(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Staff,
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let db = test_support::db().await;
        let created = db.users().create(staff("dana")).await.unwrap();

        let found = db.users().get_by_username("dana").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.role, Role::Staff);
        assert_eq!(db.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_username() {
        let db = test_support::db().await;
        db.users().create(staff("dana")).await.unwrap();
        let err = db.users().create(staff("dana")).await.unwrap_err();
        assert!(err.is_unique_violation_on("users.username"));
    }

    #[tokio::test]
    async fn test_promote_and_deactivate() {
        let db = test_support::db().await;
        let user = db.users().create(staff("dana")).await.unwrap();

        let updated = db
            .users()
            .update(
                &user.id,
                UserPatch {
                    role: Some(Role::Manager),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Manager);
        assert!(!updated.is_active);

        db.users().delete(&user.id).await.unwrap();
        assert!(db.users().get_by_id(&user.id).await.unwrap().is_none());
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let now = Utc::now();
        let user = User {
            id: "u".to_string(),
            username: "dana".to_string(),
            password_hash: "secret-hash".to_string(),
            role: Role::Admin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"role\":\"admin\""));
    }
}
