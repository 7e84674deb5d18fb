pub mod behavior;
pub mod carts;
pub mod common;
pub mod orders;
pub mod products;
pub mod users;

use crate::{
    db::DbPool,
    repositories::{DbBehaviorRepository, DbProductRepository},
    services::{
        behavior::BehaviorService, carts::CartService, orders::OrderService,
        products::ProductService, recommendations::RecommendationEngine, users::UserService,
    },
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub products: Arc<ProductService>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderService>,
    pub behavior: Arc<BehaviorService>,
    pub recommendations: Arc<RecommendationEngine>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        let recommendations = RecommendationEngine::new(
            Arc::new(DbProductRepository::new(db_pool.clone())),
            Arc::new(DbBehaviorRepository::new(db_pool.clone())),
        );

        Self {
            users: Arc::new(UserService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(db_pool.clone())),
            carts: Arc::new(CartService::new(db_pool.clone())),
            orders: Arc::new(OrderService::new(db_pool.clone())),
            behavior: Arc::new(BehaviorService::new(db_pool)),
            recommendations: Arc::new(recommendations),
        }
    }
}
