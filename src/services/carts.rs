use crate::{
    db::DbPool,
    entities::{
        cart::{self, Entity as Cart},
        cart_item::{self, Entity as CartItem},
        product::{self, Entity as Product},
        user_behavior::{self, ActionType},
    },
    errors::ServiceError,
    services::products::ProductResponse,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Shopping cart service. Each user owns at most one cart, created on demand.
#[derive(Clone)]
pub struct CartService {
    db_pool: Arc<DbPool>,
}

impl CartService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Returns the user's cart, creating an empty one on first access.
    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: i32) -> Result<CartResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;
        super::require_user(&txn, user_id).await?;
        let cart = get_or_create_cart(&txn, user_id).await?;
        let response = load_cart(&txn, cart).await?;
        txn.commit().await?;
        Ok(response)
    }

    /// Adds one unit of `product_id` and records an `AddToCart` event.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        user_id: i32,
        product_id: i32,
    ) -> Result<CartResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;

        super::require_user(&txn, user_id).await?;
        super::require_product(&txn, product_id).await?;
        let cart = get_or_create_cart(&txn, user_id).await?;

        let existing_item = CartItem::find()
            .filter(cart_item::Column::CartId.eq(cart.cart_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&txn)
            .await?;

        if let Some(item) = existing_item {
            let quantity = item.quantity.checked_add(1).ok_or_else(|| {
                ServiceError::BadRequest("Cart item quantity is too large.".to_string())
            })?;
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.update(&txn).await?;
        } else {
            cart_item::ActiveModel {
                cart_id: Set(cart.cart_id),
                product_id: Set(product_id),
                quantity: Set(1),
                added_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        user_behavior::ActiveModel {
            user_id: Set(user_id),
            product_id: Set(product_id),
            action_type: Set(ActionType::AddToCart),
            timestamp: Set(Utc::now()),
            session_id: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let response = load_cart(&txn, cart).await?;
        txn.commit().await?;

        info!(user_id, product_id, "Added item to cart");
        Ok(response)
    }

    /// Sets the quantity of an existing line. Zero or less removes it.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        user_id: i32,
        product_id: i32,
        quantity: i32,
    ) -> Result<CartResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;
        let (cart, item) = find_line(&txn, user_id, product_id).await?;

        if quantity > 0 {
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.update(&txn).await?;
            info!(user_id, product_id, quantity, "Cart item quantity updated");
        } else {
            item.delete(&txn).await?;
            info!(user_id, product_id, "Cart item removed by zero quantity");
        }

        let response = load_cart(&txn, cart).await?;
        txn.commit().await?;
        Ok(response)
    }

    #[instrument(skip(self))]
    pub async fn remove_item(&self, user_id: i32, product_id: i32) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let (_, item) = find_line(&txn, user_id, product_id).await?;
        item.delete(&txn).await?;
        txn.commit().await?;

        info!(user_id, product_id, "Removed item from cart");
        Ok(())
    }
}

/// Reads the `quantity` field of an update request body.
pub fn parse_quantity(body: Option<&Value>) -> Result<i32, ServiceError> {
    let raw = match body.and_then(|b| b.get("quantity")) {
        None | Some(Value::Null) => {
            return Err(ServiceError::BadRequest("Quantity is required.".to_string()))
        }
        Some(raw) => raw,
    };

    let parsed = match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed
        .and_then(|q| i32::try_from(q).ok())
        .ok_or_else(|| ServiceError::BadRequest("Quantity must be an integer.".to_string()))
}

async fn get_or_create_cart<C>(conn: &C, user_id: i32) -> Result<cart::Model, ServiceError>
where
    C: ConnectionTrait,
{
    if let Some(cart) = find_cart(conn, user_id).await? {
        return Ok(cart);
    }

    let cart = cart::ActiveModel {
        user_id: Set(user_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await?;
    info!(user_id, cart_id = cart.cart_id, "Created cart");
    Ok(cart)
}

pub(crate) async fn find_cart<C>(conn: &C, user_id: i32) -> Result<Option<cart::Model>, ServiceError>
where
    C: ConnectionTrait,
{
    Ok(Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(conn)
        .await?)
}

async fn find_line<C>(
    conn: &C,
    user_id: i32,
    product_id: i32,
) -> Result<(cart::Model, cart_item::Model), ServiceError>
where
    C: ConnectionTrait,
{
    super::require_user(conn, user_id).await?;
    let cart = find_cart(conn, user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Cart"))?;

    let item = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart.cart_id))
        .filter(cart_item::Column::ProductId.eq(product_id))
        .one(conn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Cart item"))?;

    Ok((cart, item))
}

/// Cart lines with their products, in insertion order.
pub(crate) async fn load_lines<C>(
    conn: &C,
    cart_id: i32,
) -> Result<Vec<(cart_item::Model, product::Model)>, ServiceError>
where
    C: ConnectionTrait,
{
    let rows = CartItem::find()
        .filter(cart_item::Column::CartId.eq(cart_id))
        .order_by_asc(cart_item::Column::CartItemId)
        .find_also_related(Product)
        .all(conn)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| (item, p)))
        .collect())
}

async fn load_cart<C>(conn: &C, cart: cart::Model) -> Result<CartResponse, ServiceError>
where
    C: ConnectionTrait,
{
    let items = load_lines(conn, cart.cart_id)
        .await?
        .into_iter()
        .map(|(item, product)| CartItemResponse {
            cart_item_id: item.cart_item_id,
            product: product.into(),
            quantity: item.quantity,
            added_at: item.added_at,
        })
        .collect();

    Ok(CartResponse {
        cart_id: cart.cart_id,
        user: cart.user_id,
        created_at: cart.created_at,
        items,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartItemResponse {
    pub cart_item_id: i32,
    pub product: ProductResponse,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub cart_id: i32,
    /// Owning user id
    pub user: i32,
    pub created_at: DateTime<Utc>,
    pub items: Vec<CartItemResponse>,
}

/// Body of the quantity update endpoint
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    #[schema(example = 3)]
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"quantity": 3}), 3)]
    #[case(json!({"quantity": "4"}), 4)]
    #[case(json!({"quantity": 0}), 0)]
    #[case(json!({"quantity": -2}), -2)]
    fn accepts_integer_quantities(#[case] body: Value, #[case] expected: i32) {
        assert_eq!(parse_quantity(Some(&body)).unwrap(), expected);
    }

    #[rstest]
    #[case(None)]
    #[case(Some(json!({})))]
    #[case(Some(json!({"quantity": null})))]
    fn missing_quantity_is_required(#[case] body: Option<Value>) {
        assert_matches!(
            parse_quantity(body.as_ref()),
            Err(ServiceError::BadRequest(msg)) if msg == "Quantity is required."
        );
    }

    #[rstest]
    #[case(json!({"quantity": "abc"}))]
    #[case(json!({"quantity": 1.5}))]
    #[case(json!({"quantity": [1]}))]
    #[case(json!({"quantity": 99999999999_i64}))]
    fn non_integer_quantity_is_rejected(#[case] body: Value) {
        assert_matches!(
            parse_quantity(Some(&body)),
            Err(ServiceError::BadRequest(msg)) if msg == "Quantity must be an integer."
        );
    }
}
