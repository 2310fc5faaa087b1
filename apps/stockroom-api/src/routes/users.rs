//! Account administration. Admin only.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::ApiJson;
use crate::auth::{hash_password, AuthUser};
use crate::config::AuthSettings;
use crate::error::ApiError;
use crate::AppState;
use stockroom_core::validation::validate_password;
use stockroom_core::{Permission, Role, User};
use stockroom_db::{Database, NewUser, UserPatch};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Role,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub password: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

pub async fn list(user: AuthUser, State(state): State<AppState>) -> Result<Json<Vec<User>>, ApiError> {
    user.require(Permission::ManageUsers)?;
    Ok(Json(state.db.users().list_all().await?))
}

pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    user.require(Permission::ManageUsers)?;
    validate_password(&req.password)?;

    let created = state
        .db
        .users()
        .create(NewUser {
            username: req.username,
            password_hash: hash_password(&req.password)?,
            role: req.role,
        })
        .await?;

    info!(by = %user.username, user = %created.username, role = %created.role, "User created");
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    user.require(Permission::ManageUsers)?;

    let password_hash = match req.password {
        Some(password) => {
            validate_password(&password)?;
            Some(hash_password(&password)?)
        }
        None => None,
    };

    let updated = state
        .db
        .users()
        .update(
            &id,
            UserPatch {
                password_hash,
                role: req.role,
                is_active: req.is_active,
            },
        )
        .await?;
    Ok(Json(updated))
}

pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Permission::ManageUsers)?;
    if user.id == id {
        return Err(ApiError::validation("You cannot delete your own account"));
    }
    state.db.users().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Creates the configured admin when no user exists yet.
///
/// Returns the new account, or `None` if users exist or no password is set.
pub async fn bootstrap_admin(db: &Database, auth: &AuthSettings) -> Result<Option<User>, ApiError> {
    if db.users().count().await? > 0 {
        return Ok(None);
    }
    let Some(password) = auth.bootstrap_admin_password.as_deref() else {
        return Ok(None);
    };
    validate_password(password)?;

    let admin = db
        .users()
        .create(NewUser {
            username: auth.bootstrap_admin_username.clone(),
            password_hash: hash_password(password)?,
            role: Role::Admin,
        })
        .await?;

    info!(user = %admin.username, "Bootstrap admin created");
    Ok(Some(admin))
}
