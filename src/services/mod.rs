pub mod behavior;
pub mod carts;
pub mod orders;
pub mod products;
pub mod recommendations;
pub mod users;

use sea_orm::{ConnectionTrait, EntityTrait};

use crate::entities::{product, user};
use crate::errors::ServiceError;

/// Loads a user or fails with `"User not found."`.
pub(crate) async fn require_user<C>(conn: &C, user_id: i32) -> Result<user::Model, ServiceError>
where
    C: ConnectionTrait,
{
    user::Entity::find_by_id(user_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))
}

/// Loads a product or fails with `"Product not found."`.
pub(crate) async fn require_product<C>(
    conn: &C,
    product_id: i32,
) -> Result<product::Model, ServiceError>
where
    C: ConnectionTrait,
{
    product::Entity::find_by_id(product_id)
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Product"))
}
