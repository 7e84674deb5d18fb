//! Product recommendation engine.
//!
//! Recommendations are built tier by tier into an ordered, de-duplicated list:
//!
//! 1. every other product in the target's category (id ascending);
//! 2. when the target carries attributes, every other product whose brand
//!    matches or whose tags overlap;
//! 3. only if nothing matched so far, the most purchased products, and failing
//!    that the most recently added ones.
//!
//! The list is truncated to [`MAX_RECOMMENDATIONS`] at the very end. The
//! engine holds no state and never writes.

use metrics::{counter, histogram};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::entities::{product, user_behavior::ActionType};
use crate::errors::ServiceError;
use crate::repositories::{BehaviorRepository, ProductRepository};

pub const MAX_RECOMMENDATIONS: usize = 10;

/// Which tier produced a recommendation list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Category and/or attribute matches
    Similar,
    /// Most purchased products
    Trending,
    /// Newest products
    Recent,
    /// Nothing to recommend
    None,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Similar => "similar",
            Strategy::Trending => "trending",
            Strategy::Recent => "recent",
            Strategy::None => "none",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Recommendations {
    pub strategy: Strategy,
    pub products: Vec<product::Model>,
}

/// Insertion-ordered set of products keyed by id. The target is never admitted.
struct Accumulator {
    target_id: i32,
    seen: HashSet<i32>,
    products: Vec<product::Model>,
}

impl Accumulator {
    fn new(target_id: i32) -> Self {
        Self {
            target_id,
            seen: HashSet::new(),
            products: Vec::new(),
        }
    }

    fn extend<I>(&mut self, candidates: I)
    where
        I: IntoIterator<Item = product::Model>,
    {
        for candidate in candidates {
            if candidate.product_id != self.target_id && self.seen.insert(candidate.product_id) {
                self.products.push(candidate);
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    fn into_truncated(mut self, limit: usize) -> Vec<product::Model> {
        self.products.truncate(limit);
        self.products
    }
}

#[derive(Clone)]
pub struct RecommendationEngine {
    products: Arc<dyn ProductRepository>,
    behaviors: Arc<dyn BehaviorRepository>,
}

impl RecommendationEngine {
    pub fn new(
        products: Arc<dyn ProductRepository>,
        behaviors: Arc<dyn BehaviorRepository>,
    ) -> Self {
        Self {
            products,
            behaviors,
        }
    }

    /// Recommends up to [`MAX_RECOMMENDATIONS`] products for `product_id`.
    ///
    /// Fails with [`ServiceError::NotFound`] when the product does not exist.
    #[instrument(skip(self))]
    pub async fn recommend(&self, product_id: i32) -> Result<Recommendations, ServiceError> {
        let started = Instant::now();

        let target = self
            .products
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product"))?;

        let mut accumulated = Accumulator::new(target.product_id);

        accumulated.extend(
            self.products
                .filter_by_category(&target.category, target.product_id)
                .await?,
        );

        let target_attributes = target.parsed_attributes();
        if target_attributes.is_empty() {
            debug!("target has no attributes, skipping attribute matching");
        } else {
            let candidates = self.products.excluding_id(target.product_id).await?;
            accumulated.extend(
                candidates
                    .into_iter()
                    .filter(|candidate| target_attributes.is_similar_to(&candidate.parsed_attributes())),
            );
        }

        let strategy = if !accumulated.is_empty() {
            Strategy::Similar
        } else {
            accumulated.extend(self.trending(target.product_id).await?);
            if !accumulated.is_empty() {
                Strategy::Trending
            } else {
                accumulated.extend(
                    self.products
                        .most_recent(MAX_RECOMMENDATIONS as u64, target.product_id)
                        .await?,
                );
                if accumulated.is_empty() {
                    Strategy::None
                } else {
                    Strategy::Recent
                }
            }
        };

        let products = accumulated.into_truncated(MAX_RECOMMENDATIONS);

        counter!("storefront_recommendations_total", 1, "strategy" => strategy.as_str());
        histogram!(
            "storefront_recommendations_duration_seconds",
            started.elapsed().as_secs_f64()
        );
        info!(
            product_id,
            %strategy,
            count = products.len(),
            "recommendations computed"
        );

        Ok(Recommendations { strategy, products })
    }

    /// Most purchased products other than `exclude_id`, in purchase-rank order.
    async fn trending(&self, exclude_id: i32) -> Result<Vec<product::Model>, ServiceError> {
        let ranked = self
            .behaviors
            .top_products_by_action(
                ActionType::Purchase,
                MAX_RECOMMENDATIONS as u64,
                Some(exclude_id),
            )
            .await?;

        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = ranked.iter().map(|entry| entry.product_id).collect();
        let mut by_id: HashMap<i32, product::Model> = self
            .products
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|product| (product.product_id, product))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::ProductCount;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use mockall::mock;
    use rust_decimal_macros::dec;

    mock! {
        pub Products {}

        #[async_trait]
        impl ProductRepository for Products {
            async fn get_by_id(&self, id: i32) -> Result<Option<product::Model>, ServiceError>;
            async fn filter_by_category(
                &self,
                category: &str,
                exclude_id: i32,
            ) -> Result<Vec<product::Model>, ServiceError>;
            async fn all(&self) -> Result<Vec<product::Model>, ServiceError>;
            async fn excluding_id(&self, id: i32) -> Result<Vec<product::Model>, ServiceError>;
            async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<product::Model>, ServiceError>;
            async fn most_recent(
                &self,
                limit: u64,
                exclude_id: i32,
            ) -> Result<Vec<product::Model>, ServiceError>;
        }
    }

    mock! {
        pub Behaviors {}

        #[async_trait]
        impl BehaviorRepository for Behaviors {
            async fn top_products_by_action(
                &self,
                action: ActionType,
                limit: u64,
                exclude_product_id: Option<i32>,
            ) -> Result<Vec<ProductCount>, ServiceError>;
        }
    }

    fn product(id: i32, category: &str, attributes: Option<&str>) -> product::Model {
        product::Model {
            product_id: id,
            name: format!("Product {id}"),
            description: None,
            category: category.to_string(),
            price: dec!(9.99),
            stock_quantity: 5,
            image_url: None,
            attributes: attributes.map(str::to_string),
        }
    }

    fn ids(recommendations: &Recommendations) -> Vec<i32> {
        recommendations
            .products
            .iter()
            .map(|p| p.product_id)
            .collect()
    }

    fn engine(products: MockProducts, behaviors: MockBehaviors) -> RecommendationEngine {
        RecommendationEngine::new(Arc::new(products), Arc::new(behaviors))
    }

    fn expect_target(products: &mut MockProducts, target: product::Model) {
        let id = target.product_id;
        products
            .expect_get_by_id()
            .withf(move |requested| *requested == id)
            .returning(move |_| Ok(Some(target.clone())));
    }

    #[tokio::test]
    async fn unknown_product_is_not_found() {
        let mut products = MockProducts::new();
        products.expect_get_by_id().returning(|_| Ok(None));

        let result = engine(products, MockBehaviors::new()).recommend(404).await;

        assert_matches!(result, Err(ServiceError::NotFound(msg)) if msg == "Product not found.");
    }

    #[tokio::test]
    async fn category_match_comes_before_brand_match() {
        let mut products = MockProducts::new();
        expect_target(
            &mut products,
            product(1, "Electronics", Some(r#"{"brand":"Acme"}"#)),
        );
        products
            .expect_filter_by_category()
            .withf(|category, exclude| category == "Electronics" && *exclude == 1)
            .returning(|_, _| Ok(vec![product(2, "Electronics", None)]));
        products.expect_excluding_id().returning(|_| {
            Ok(vec![
                product(2, "Electronics", None),
                product(3, "Kitchen", Some(r#"{"brand":"Acme"}"#)),
                product(4, "Kitchen", Some(r#"{"brand":"Globex"}"#)),
            ])
        });

        let result = engine(products, MockBehaviors::new())
            .recommend(1)
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![2, 3]);
        assert_eq!(result.strategy, Strategy::Similar);
    }

    #[tokio::test]
    async fn tag_overlap_counts_as_similar() {
        let mut products = MockProducts::new();
        expect_target(
            &mut products,
            product(1, "Audio", Some(r#"{"tags":["wireless","bluetooth"]}"#)),
        );
        products
            .expect_filter_by_category()
            .returning(|_, _| Ok(vec![]));
        products.expect_excluding_id().returning(|_| {
            Ok(vec![
                product(2, "Toys", Some(r#"{"tags":["bluetooth"]}"#)),
                product(3, "Toys", Some(r#"{"tags":["wooden"]}"#)),
                product(4, "Toys", Some("{broken")),
            ])
        });

        let result = engine(products, MockBehaviors::new())
            .recommend(1)
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![2]);
    }

    #[tokio::test]
    async fn malformed_target_attributes_skip_attribute_tier() {
        let mut products = MockProducts::new();
        expect_target(&mut products, product(1, "Books", Some("{not json")));
        products
            .expect_filter_by_category()
            .returning(|_, _| Ok(vec![product(7, "Books", None)]));
        products.expect_excluding_id().never();

        let result = engine(products, MockBehaviors::new())
            .recommend(1)
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![7]);
    }

    #[tokio::test]
    async fn product_matching_both_tiers_appears_once() {
        let mut products = MockProducts::new();
        expect_target(
            &mut products,
            product(1, "Electronics", Some(r#"{"brand":"Acme"}"#)),
        );
        products
            .expect_filter_by_category()
            .returning(|_, _| Ok(vec![product(2, "Electronics", Some(r#"{"brand":"Acme"}"#))]));
        products.expect_excluding_id().returning(|_| {
            Ok(vec![product(2, "Electronics", Some(r#"{"brand":"Acme"}"#))])
        });

        let result = engine(products, MockBehaviors::new())
            .recommend(1)
            .await
            .unwrap();

        assert_eq!(ids(&result), vec![2]);
    }

    #[tokio::test]
    async fn similar_results_are_truncated_to_ten() {
        let mut products = MockProducts::new();
        expect_target(&mut products, product(1, "Garden", None));
        products
            .expect_filter_by_category()
            .returning(|_, _| Ok((2..=16).map(|id| product(id, "Garden", None)).collect()));

        let mut behaviors = MockBehaviors::new();
        behaviors.expect_top_products_by_action().never();

        let result = engine(products, behaviors).recommend(1).await.unwrap();

        assert_eq!(ids(&result), (2..=11).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn trending_fallback_keeps_purchase_rank() {
        let mut products = MockProducts::new();
        expect_target(&mut products, product(1, "Lonely", None));
        products
            .expect_filter_by_category()
            .returning(|_, _| Ok(vec![]));
        products
            .expect_find_by_ids()
            .withf(|ids| *ids == [5, 3, 4])
            .returning(|_| {
                Ok(vec![
                    product(3, "Misc", None),
                    product(4, "Misc", None),
                    product(5, "Misc", None),
                ])
            });
        products.expect_most_recent().never();

        let mut behaviors = MockBehaviors::new();
        behaviors
            .expect_top_products_by_action()
            .withf(|action, limit, exclude| {
                *action == ActionType::Purchase && *limit == 10 && *exclude == Some(1)
            })
            .returning(|_, _, _| {
                Ok(vec![
                    ProductCount { product_id: 5, count: 4 },
                    ProductCount { product_id: 3, count: 2 },
                    ProductCount { product_id: 4, count: 2 },
                ])
            });

        let result = engine(products, behaviors).recommend(1).await.unwrap();

        assert_eq!(ids(&result), vec![5, 3, 4]);
        assert_eq!(result.strategy, Strategy::Trending);
    }

    #[tokio::test]
    async fn most_recent_fallback_without_purchases() {
        let mut products = MockProducts::new();
        expect_target(&mut products, product(1, "Lonely", None));
        products
            .expect_filter_by_category()
            .returning(|_, _| Ok(vec![]));
        products
            .expect_most_recent()
            .withf(|limit, exclude| *limit == 10 && *exclude == 1)
            .returning(|_, _| Ok(vec![product(9, "Misc", None), product(8, "Misc", None)]));

        let mut behaviors = MockBehaviors::new();
        behaviors
            .expect_top_products_by_action()
            .returning(|_, _, _| Ok(vec![]));

        let result = engine(products, behaviors).recommend(1).await.unwrap();

        assert_eq!(ids(&result), vec![9, 8]);
        assert_eq!(result.strategy, Strategy::Recent);
    }

    #[tokio::test]
    async fn lone_product_gets_nothing() {
        let mut products = MockProducts::new();
        expect_target(&mut products, product(1, "Lonely", Some("{}")));
        products
            .expect_filter_by_category()
            .returning(|_, _| Ok(vec![]));
        products.expect_most_recent().returning(|_, _| Ok(vec![]));

        let mut behaviors = MockBehaviors::new();
        behaviors
            .expect_top_products_by_action()
            .returning(|_, _, _| Ok(vec![]));

        let result = engine(products, behaviors).recommend(1).await.unwrap();

        assert!(result.products.is_empty());
        assert_eq!(result.strategy, Strategy::None);
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let mut products = MockProducts::new();
        products
            .expect_get_by_id()
            .returning(|_| Err(ServiceError::DatabaseError(sea_orm::DbErr::Custom("down".into()))));

        let result = engine(products, MockBehaviors::new()).recommend(1).await;

        assert_matches!(result, Err(ServiceError::DatabaseError(_)));
    }

    #[test]
    fn accumulator_rejects_target_and_duplicates() {
        let mut acc = Accumulator::new(1);
        acc.extend(vec![
            product(1, "A", None),
            product(2, "A", None),
            product(2, "A", None),
            product(3, "A", None),
        ]);
        let kept: Vec<i32> = acc.into_truncated(2).iter().map(|p| p.product_id).collect();
        assert_eq!(kept, vec![2, 3]);
    }
}
