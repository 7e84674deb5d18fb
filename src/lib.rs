//! Storefront API
//!
//! CRUD e-commerce backend (users, products, carts, orders, behavior logs)
//! with a tiered product recommendation engine.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Instant;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// All storefront routes plus health and OpenAPI docs, without transport
/// layers (CORS, compression, tracing) so tests can drive it directly.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::users::user_routes())
        .merge(handlers::products::product_routes())
        .merge(handlers::carts::cart_routes())
        .merge(handlers::orders::order_routes())
        .merge(handlers::behavior::behavior_routes())
        .merge(health::health_routes())
}

/// Builds the application router with request ids and HTTP tracing applied.
pub fn app(state: AppState) -> Router {
    api_routes()
        .with_state(state)
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}
