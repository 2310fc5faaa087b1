//! # Stockroom API
//!
//! HTTP JSON service over [`stockroom_db`].
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Stockroom API                                    │
//! │                                                                         │
//! │  request ──► TraceLayer ──► CorsLayer ──► Router                        │
//! │                                             │                           │
//! │              ┌──────────────────────────────┼───────────────────────┐   │
//! │              ▼                              ▼                       ▼   │
//! │        /health, /storefront          /api/auth/login         /api/...   │
//! │        (public)                      (public)           AuthUser + role │
//! │                                                                 │       │
//! │                                                                 ▼       │
//! │                                                   AppState.db repositories │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use stockroom_db::Database;

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let jwt = JwtManager::new(
            config.auth.jwt_secret.clone(),
            config.auth.token_lifetime_secs,
        );
        AppState {
            db,
            jwt: Arc::new(jwt),
            config: Arc::new(config),
        }
    }
}

/// Builds the full router with tracing and CORS layers.
pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(routes::public_routes())
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
