//! # Routes
//!
//! Handlers stay thin: authorize, call one repository method, wrap the
//! result in JSON. Business rules live in `stockroom-core` and
//! `stockroom-db`.

use axum::extract::{FromRequest, FromRequestParts};
use axum::routing::{get, patch, post};
use axum::Router;

use crate::error::ApiError;
use crate::AppState;

pub mod batches;
pub mod categories;
pub mod fields;
pub mod health;
pub mod inventory;
pub mod products;
pub mod session;
pub mod storefront;
pub mod stores;
pub mod users;

/// `axum::Json` whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` whose rejections use the API error body.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);

/// Routes that need no token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/storefront/products", get(storefront::list_products))
}

/// Everything under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(session::login))
        .route("/auth/me", get(session::me))
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", patch(users::update).delete(users::delete))
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get).patch(products::update).delete(products::delete),
        )
        .route("/fields", get(fields::list).post(fields::create))
        .route("/fields/{id}", patch(fields::update).delete(fields::delete))
        .route("/categories", get(categories::tree).post(categories::create))
        .route(
            "/categories/{id}",
            patch(categories::update).delete(categories::delete),
        )
        .route("/categories/{id}/move", post(categories::move_to))
        .route("/stores", get(stores::list).post(stores::create))
        .route("/stores/{id}", patch(stores::update).delete(stores::delete))
        .route("/batches", get(batches::list).post(batches::create))
        .route(
            "/batches/{id}",
            get(batches::get).patch(batches::update).delete(batches::delete),
        )
        .route(
            "/batches/{id}/admission",
            get(batches::admission_status).post(batches::admit),
        )
        .route("/inventory", get(inventory::list))
        .route("/inventory/{id}", get(inventory::get).patch(inventory::update))
}
