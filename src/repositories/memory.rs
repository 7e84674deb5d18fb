//! In-memory repositories for tests, benchmarks and local experiments.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::{BehaviorRepository, ProductCount, ProductRepository};
use crate::entities::{product, user_behavior::ActionType};
use crate::errors::ServiceError;

/// Product catalog held in a vector, kept sorted by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductRepository {
    products: Arc<RwLock<Vec<product::Model>>>,
}

impl InMemoryProductRepository {
    pub fn new(mut products: Vec<product::Model>) -> Self {
        products.sort_by_key(|p| p.product_id);
        products.dedup_by_key(|p| p.product_id);
        Self {
            products: Arc::new(RwLock::new(products)),
        }
    }

    /// Adds or replaces a product.
    pub async fn upsert(&self, product: product::Model) {
        let mut products = self.products.write().await;
        match products.binary_search_by_key(&product.product_id, |p| p.product_id) {
            Ok(idx) => products[idx] = product,
            Err(idx) => products.insert(idx, product),
        }
    }

    async fn matching<F>(&self, keep: F) -> Vec<product::Model>
    where
        F: Fn(&product::Model) -> bool,
    {
        self.products
            .read()
            .await
            .iter()
            .filter(|p| keep(p))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn get_by_id(&self, id: i32) -> Result<Option<product::Model>, ServiceError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| p.product_id == id)
            .cloned())
    }

    async fn filter_by_category(
        &self,
        category: &str,
        exclude_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(self
            .matching(|p| p.category == category && p.product_id != exclude_id)
            .await)
    }

    async fn all(&self) -> Result<Vec<product::Model>, ServiceError> {
        Ok(self.products.read().await.clone())
    }

    async fn excluding_id(&self, id: i32) -> Result<Vec<product::Model>, ServiceError> {
        Ok(self.matching(|p| p.product_id != id).await)
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<product::Model>, ServiceError> {
        Ok(self.matching(|p| ids.contains(&p.product_id)).await)
    }

    async fn most_recent(
        &self,
        limit: u64,
        exclude_id: i32,
    ) -> Result<Vec<product::Model>, ServiceError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .rev()
            .filter(|p| p.product_id != exclude_id)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

/// Behavior log reduced to `(product_id, action)` pairs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBehaviorRepository {
    events: Arc<RwLock<Vec<(i32, ActionType)>>>,
}

impl InMemoryBehaviorRepository {
    pub fn new(events: Vec<(i32, ActionType)>) -> Self {
        Self {
            events: Arc::new(RwLock::new(events)),
        }
    }

    pub async fn record(&self, product_id: i32, action: ActionType) {
        self.events.write().await.push((product_id, action));
    }
}

#[async_trait]
impl BehaviorRepository for InMemoryBehaviorRepository {
    async fn top_products_by_action(
        &self,
        action: ActionType,
        limit: u64,
        exclude_product_id: Option<i32>,
    ) -> Result<Vec<ProductCount>, ServiceError> {
        let mut counts: HashMap<i32, i64> = HashMap::new();
        for (product_id, recorded) in self.events.read().await.iter() {
            if *recorded == action && Some(*product_id) != exclude_product_id {
                *counts.entry(*product_id).or_default() += 1;
            }
        }

        let mut ranked: Vec<ProductCount> = counts
            .into_iter()
            .map(|(product_id, count)| ProductCount { product_id, count })
            .collect();
        ranked.sort_by(|a, b| b.count.cmp(&a.count).then(a.product_id.cmp(&b.product_id)));
        ranked.truncate(limit as usize);
        Ok(ranked)
    }
}
