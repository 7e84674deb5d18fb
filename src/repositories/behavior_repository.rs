use async_trait::async_trait;
use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use std::sync::Arc;
use tracing::error;

use crate::entities::user_behavior::{ActionType, Column, Entity as UserBehavior};
use crate::errors::ServiceError;

use super::{BaseRepository, BehaviorRepository, ProductCount, Repository};

/// sea-orm backed [`BehaviorRepository`]
#[derive(Debug, Clone)]
pub struct DbBehaviorRepository {
    base: BaseRepository,
}

impl DbBehaviorRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

fn action_count() -> SimpleExpr {
    Expr::col((UserBehavior, Column::BehaviorId)).count()
}

#[async_trait]
impl BehaviorRepository for DbBehaviorRepository {
    async fn top_products_by_action(
        &self,
        action: ActionType,
        limit: u64,
        exclude_product_id: Option<i32>,
    ) -> Result<Vec<ProductCount>, ServiceError> {
        let mut query = UserBehavior::find()
            .select_only()
            .column(Column::ProductId)
            .column_as(action_count(), "action_count")
            .filter(Column::ActionType.eq(action));

        if let Some(excluded) = exclude_product_id {
            query = query.filter(Column::ProductId.ne(excluded));
        }

        let rows: Vec<(i32, i64)> = query
            .group_by(Column::ProductId)
            .order_by_desc(action_count())
            .order_by_asc(Column::ProductId)
            .limit(limit)
            .into_tuple()
            .all(self.get_db())
            .await
            .map_err(|e| {
                error!(%action, error = %e, "behavior aggregation failed");
                ServiceError::DatabaseError(e)
            })?;

        Ok(rows
            .into_iter()
            .map(|(product_id, count)| ProductCount { product_id, count })
            .collect())
    }
}

impl Repository for DbBehaviorRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection, run_migrations};
    use crate::entities::{product, user, user_behavior};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use sea_orm::{ActiveModelTrait, Set};

    async fn log(db: &DatabaseConnection, product_id: i32, action: ActionType) {
        user_behavior::ActiveModel {
            user_id: Set(1),
            product_id: Set(product_id),
            action_type: Set(action),
            timestamp: Set(Utc::now()),
            session_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn counts_are_grouped_and_ranked() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();

        user::ActiveModel {
            name: Set("Shopper".into()),
            email: Set("shopper@example.com".into()),
            password: Set("hash".into()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        for name in ["A", "B", "C", "D"] {
            product::ActiveModel {
                name: Set(name.into()),
                category: Set("Misc".into()),
                price: Set(dec!(1.00)),
                stock_quantity: Set(0),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
        }

        for (product_id, action) in [
            (2, ActionType::Purchase),
            (3, ActionType::Purchase),
            (3, ActionType::Purchase),
            (1, ActionType::Purchase),
            (4, ActionType::View),
            (4, ActionType::View),
            (4, ActionType::View),
        ] {
            log(&db, product_id, action).await;
        }

        let repo = DbBehaviorRepository::new(Arc::new(db));
        let top = repo
            .top_products_by_action(ActionType::Purchase, 10, None)
            .await
            .unwrap();
        assert_eq!(
            top,
            vec![
                ProductCount { product_id: 3, count: 2 },
                ProductCount { product_id: 1, count: 1 },
                ProductCount { product_id: 2, count: 1 },
            ]
        );

        let without_three = repo
            .top_products_by_action(ActionType::Purchase, 1, Some(3))
            .await
            .unwrap();
        assert_eq!(without_three, vec![ProductCount { product_id: 1, count: 1 }]);
    }
}
