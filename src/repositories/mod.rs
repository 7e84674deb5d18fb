//! Data-access layer consumed by the recommendation engine.
//!
//! The traits are the seams: the engine only sees [`ProductRepository`] and
//! [`BehaviorRepository`], so tests can swap in mocks or in-memory fakes.

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::entities::{product, user_behavior::ActionType};
use crate::errors::ServiceError;

pub mod behavior_repository;
pub mod memory;
pub mod product_repository;

pub use behavior_repository::DbBehaviorRepository;
pub use memory::{InMemoryBehaviorRepository, InMemoryProductRepository};
pub use product_repository::DbProductRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Read access to the product catalog. Every scan is ordered by id ascending
/// unless stated otherwise.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> Result<Option<product::Model>, ServiceError>;

    /// Products in `category` other than `exclude_id`.
    async fn filter_by_category(
        &self,
        category: &str,
        exclude_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError>;

    async fn all(&self) -> Result<Vec<product::Model>, ServiceError>;

    async fn excluding_id(&self, id: i32) -> Result<Vec<product::Model>, ServiceError>;

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<product::Model>, ServiceError>;

    /// Up to `limit` products ordered by id descending, skipping `exclude_id`.
    async fn most_recent(
        &self,
        limit: u64,
        exclude_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError>;
}

/// How often a product appears in the behavior log for one action kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductCount {
    pub product_id: i32,
    pub count: i64,
}

#[async_trait]
pub trait BehaviorRepository: Send + Sync {
    /// Top `limit` products by number of `action` entries, count descending
    /// then product id ascending.
    async fn top_products_by_action(
        &self,
        action: ActionType,
        limit: u64,
        exclude_product_id: Option<i32>,
    ) -> Result<Vec<ProductCount>, ServiceError>;
}
