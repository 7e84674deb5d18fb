#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use storefront_api::{
    config::AppConfig,
    db,
    services::{
        products::{ProductInput, ProductResponse},
        users::{CreateUserInput, UserResponse},
    },
    AppState,
};
use tower::ServiceExt;

/// Helper harness for spinning up the application against an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with a fresh, migrated database.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single connection keeps the in-memory database alive and shared.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = storefront_api::app(state.clone());

        Self { router, state }
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Option<Value>) -> Response {
        self.request(Method::POST, uri, body).await
    }

    pub async fn seed_user(&self, name: &str, email: &str) -> UserResponse {
        self.state
            .services
            .users
            .create_user(CreateUserInput {
                name: name.to_string(),
                email: email.to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .expect("seed user")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        category: &str,
        price: Decimal,
        attributes: Option<Value>,
    ) -> ProductResponse {
        self.state
            .services
            .products
            .create_product(ProductInput {
                name: name.to_string(),
                description: None,
                category: category.to_string(),
                price,
                stock_quantity: Some(10),
                image_url: None,
                attributes,
            })
            .await
            .expect("seed product")
    }

    pub async fn seed_branded(&self, name: &str, category: &str, brand: &str) -> ProductResponse {
        self.seed_product(
            name,
            category,
            Decimal::new(1000, 2),
            Some(json!({ "brand": brand })),
        )
        .await
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// Product ids of a recommendation or product list payload, in order.
pub fn product_ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .expect("array body")
        .iter()
        .map(|p| p["product_id"].as_i64().expect("product_id"))
        .collect()
}
