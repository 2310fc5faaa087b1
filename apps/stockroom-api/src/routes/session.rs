//! Login and token introspection.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::ApiJson;
use crate::auth::{verify_password, AuthUser};
use crate::error::ApiError;
use crate::AppState;
use stockroom_core::User;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state.db.users().get_by_username(&req.username).await?;

    // Same answer for unknown user, wrong password, and disabled account.
    let user = match user {
        Some(user) if user.is_active && verify_password(&req.password, &user.password_hash) => user,
        _ => {
            warn!(username = %req.username.trim(), "Failed login attempt");
            return Err(ApiError::unauthorized("Invalid username or password"));
        }
    };

    let token = state.jwt.issue(&user)?;
    info!(user = %user.username, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.lifetime_secs(),
        user,
    }))
}

pub async fn me(user: AuthUser) -> Json<AuthUser> {
    Json(user)
}
