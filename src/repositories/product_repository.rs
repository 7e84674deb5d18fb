use async_trait::async_trait;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use std::sync::Arc;
use tracing::error;

use crate::entities::product::{Column, Entity as Product, Model as ProductModel};
use crate::errors::ServiceError;

use super::{BaseRepository, ProductRepository, Repository};

/// sea-orm backed [`ProductRepository`]
#[derive(Debug, Clone)]
pub struct DbProductRepository {
    base: BaseRepository,
}

impl DbProductRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

fn log_db_error(operation: &'static str) -> impl Fn(sea_orm::DbErr) -> ServiceError {
    move |e| {
        error!(operation, error = %e, "product query failed");
        ServiceError::DatabaseError(e)
    }
}

#[async_trait]
impl ProductRepository for DbProductRepository {
    async fn get_by_id(&self, id: i32) -> Result<Option<ProductModel>, ServiceError> {
        Product::find_by_id(id)
            .one(self.get_db())
            .await
            .map_err(log_db_error("get_by_id"))
    }

    async fn filter_by_category(
        &self,
        category: &str,
        exclude_id: i32,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .filter(Column::Category.eq(category))
            .filter(Column::ProductId.ne(exclude_id))
            .order_by_asc(Column::ProductId)
            .all(self.get_db())
            .await
            .map_err(log_db_error("filter_by_category"))
    }

    async fn all(&self) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .order_by_asc(Column::ProductId)
            .all(self.get_db())
            .await
            .map_err(log_db_error("all"))
    }

    async fn excluding_id(&self, id: i32) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .filter(Column::ProductId.ne(id))
            .order_by_asc(Column::ProductId)
            .all(self.get_db())
            .await
            .map_err(log_db_error("excluding_id"))
    }

    async fn find_by_ids(&self, ids: &[i32]) -> Result<Vec<ProductModel>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Product::find()
            .filter(Column::ProductId.is_in(ids.iter().copied()))
            .order_by_asc(Column::ProductId)
            .all(self.get_db())
            .await
            .map_err(log_db_error("find_by_ids"))
    }

    async fn most_recent(
        &self,
        limit: u64,
        exclude_id: i32,
    ) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .filter(Column::ProductId.ne(exclude_id))
            .order_by_desc(Column::ProductId)
            .limit(limit)
            .all(self.get_db())
            .await
            .map_err(log_db_error("most_recent"))
    }
}

impl Repository for DbProductRepository {
    fn get_db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection, run_migrations};
    use crate::entities::product;
    use rust_decimal_macros::dec;
    use sea_orm::{ActiveModelTrait, Set};

    async fn seeded_repo() -> DbProductRepository {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();

        for (name, category) in [
            ("Laptop", "Electronics"),
            ("Blender", "Kitchen"),
            ("Phone", "Electronics"),
            ("Tablet", "Electronics"),
        ] {
            product::ActiveModel {
                name: Set(name.to_string()),
                category: Set(category.to_string()),
                price: Set(dec!(10.00)),
                stock_quantity: Set(1),
                attributes: Set(Some("{}".to_string())),
                ..Default::default()
            }
            .insert(&db)
            .await
            .unwrap();
        }

        DbProductRepository::new(Arc::new(db))
    }

    fn ids(products: &[ProductModel]) -> Vec<i32> {
        products.iter().map(|p| p.product_id).collect()
    }

    #[tokio::test]
    async fn category_scan_excludes_target_in_id_order() {
        let repo = seeded_repo().await;
        let found = repo.filter_by_category("Electronics", 3).await.unwrap();
        assert_eq!(ids(&found), vec![1, 4]);
    }

    #[tokio::test]
    async fn most_recent_is_id_descending() {
        let repo = seeded_repo().await;
        let found = repo.most_recent(2, 4).await.unwrap();
        assert_eq!(ids(&found), vec![3, 2]);
    }

    #[tokio::test]
    async fn id_set_lookup_ignores_unknown_ids() {
        let repo = seeded_repo().await;
        assert_eq!(ids(&repo.find_by_ids(&[4, 2, 99]).await.unwrap()), vec![2, 4]);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn full_scans() {
        let repo = seeded_repo().await;
        assert_eq!(ids(&repo.all().await.unwrap()), vec![1, 2, 3, 4]);
        assert_eq!(ids(&repo.excluding_id(2).await.unwrap()), vec![1, 3, 4]);
        assert!(repo.get_by_id(42).await.unwrap().is_none());
    }
}
