use crate::{
    db::DbPool,
    entities::{
        product, user,
        user_behavior::{self, ActionType, Entity as UserBehavior},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

/// Records and lists user behavior events (views, add-to-cart, purchases).
#[derive(Clone)]
pub struct BehaviorService {
    db_pool: Arc<DbPool>,
}

impl BehaviorService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_behaviors(&self) -> Result<Vec<BehaviorResponse>, ServiceError> {
        let entries = UserBehavior::find()
            .order_by_asc(user_behavior::Column::BehaviorId)
            .all(&*self.db_pool)
            .await?;
        Ok(entries.into_iter().map(BehaviorResponse::from).collect())
    }

    #[instrument(skip(self, input))]
    pub async fn create_behavior(
        &self,
        input: CreateBehaviorInput,
    ) -> Result<BehaviorResponse, ServiceError> {
        input.validate()?;
        let db = &*self.db_pool;
        super::require_user(db, input.user).await?;
        super::require_product(db, input.product).await?;

        let entry = self
            .record(input.user, input.product, input.action_type, input.session_id)
            .await?;
        Ok(entry.into())
    }

    /// Logs a product view. Either id being unknown yields a single combined error.
    #[instrument(skip(self))]
    pub async fn log_view(&self, user_id: i32, product_id: i32) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let user = user::Entity::find_by_id(user_id).one(db).await?;
        let product = product::Entity::find_by_id(product_id).one(db).await?;
        if user.is_none() || product.is_none() {
            return Err(ServiceError::NotFound(
                "User or Product not found.".to_string(),
            ));
        }

        self.record(user_id, product_id, ActionType::View, None)
            .await?;
        Ok(())
    }

    async fn record(
        &self,
        user_id: i32,
        product_id: i32,
        action_type: ActionType,
        session_id: Option<String>,
    ) -> Result<user_behavior::Model, ServiceError> {
        let entry = user_behavior::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product_id),
            action_type: Set(action_type),
            timestamp: Set(Utc::now()),
            session_id: Set(session_id),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        info!(
            behavior_id = entry.behavior_id,
            user_id,
            product_id,
            action = %action_type,
            "Behavior recorded"
        );
        Ok(entry)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "user": 1,
    "product": 42,
    "action_type": "View",
    "session_id": "sess-8c1f"
}))]
pub struct CreateBehaviorInput {
    pub user: i32,
    pub product: i32,
    pub action_type: ActionType,
    #[validate(length(max = 255))]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BehaviorResponse {
    pub behavior_id: i32,
    pub user: i32,
    pub product: i32,
    pub action_type: ActionType,
    pub timestamp: DateTime<Utc>,
    pub session_id: Option<String>,
}

impl From<user_behavior::Model> for BehaviorResponse {
    fn from(model: user_behavior::Model) -> Self {
        Self {
            behavior_id: model.behavior_id,
            user: model.user_id,
            product: model.product_id,
            action_type: model.action_type,
            timestamp: model.timestamp,
            session_id: model.session_id,
        }
    }
}

/// Body returned by the log-view endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "Product view logged successfully.")]
    pub message: String,
}
