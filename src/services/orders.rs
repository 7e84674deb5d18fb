use crate::{
    db::DbPool,
    entities::{
        cart_item::{self, Entity as CartItem},
        order::{self, Entity as Order, OrderStatus},
        order_item::{self, Entity as OrderItem},
        product::Entity as Product,
        user_behavior::{self, ActionType},
    },
    errors::ServiceError,
    services::{carts, products::ProductResponse},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

/// Turns carts into orders and serves order history.
#[derive(Clone)]
pub struct OrderService {
    db_pool: Arc<DbPool>,
}

impl OrderService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderResponse>, ServiceError> {
        let db = &*self.db_pool;
        let orders = Order::find()
            .order_by_asc(order::Column::OrderId)
            .all(db)
            .await?;

        let mut responses = Vec::with_capacity(orders.len());
        for order in orders {
            responses.push(load_order(db, order).await?);
        }
        Ok(responses)
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, order_id: i32) -> Result<OrderResponse, ServiceError> {
        let db = &*self.db_pool;
        let order = Order::find_by_id(order_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Order"))?;
        load_order(db, order).await
    }

    /// Checks out the user's cart.
    ///
    /// Within one transaction: creates the order and one line per cart item
    /// at the current product price, logs a `Purchase` per line and empties
    /// the cart.
    #[instrument(skip(self))]
    pub async fn checkout(&self, user_id: i32) -> Result<OrderResponse, ServiceError> {
        let txn = self.db_pool.begin().await?;

        super::require_user(&txn, user_id).await?;
        let cart = carts::find_cart(&txn, user_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Cart"))?;

        let lines = carts::load_lines(&txn, cart.cart_id).await?;
        if lines.is_empty() {
            warn!(user_id, "Checkout attempted with an empty cart");
            return Err(ServiceError::BadRequest("Cart is empty.".to_string()));
        }

        let total_amount: Decimal = lines
            .iter()
            .map(|(item, product)| product.price * Decimal::from(item.quantity))
            .sum();

        let now = Utc::now();
        let order = order::ActiveModel {
            user_id: Set(user_id),
            order_date: Set(now),
            total_amount: Set(total_amount),
            status: Set(OrderStatus::Pending),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        for (item, product) in &lines {
            order_item::ActiveModel {
                order_id: Set(order.order_id),
                product_id: Set(product.product_id),
                quantity: Set(item.quantity),
                unit_price: Set(product.price),
                ..Default::default()
            }
            .insert(&txn)
            .await?;

            user_behavior::ActiveModel {
                user_id: Set(user_id),
                product_id: Set(product.product_id),
                action_type: Set(ActionType::Purchase),
                timestamp: Set(now),
                session_id: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(cart.cart_id))
            .exec(&txn)
            .await?;

        let response = load_order(&txn, order).await?;
        txn.commit().await?;

        info!(
            user_id,
            order_id = response.order_id,
            lines = response.items.len(),
            total = %response.total_amount,
            "Order created from cart"
        );
        Ok(response)
    }
}

async fn load_order<C>(conn: &C, order: order::Model) -> Result<OrderResponse, ServiceError>
where
    C: ConnectionTrait,
{
    let rows = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.order_id))
        .order_by_asc(order_item::Column::OrderItemId)
        .all(conn)
        .await?;

    let product_ids: Vec<i32> = rows.iter().map(|item| item.product_id).collect();
    let products: HashMap<i32, ProductResponse> = Product::find()
        .filter(crate::entities::product::Column::ProductId.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|p| (p.product_id, ProductResponse::from(p)))
        .collect();

    let items = rows
        .into_iter()
        .filter_map(|item| {
            let product = products.get(&item.product_id).cloned()?;
            Some(OrderItemResponse {
                order_item_id: item.order_item_id,
                product,
                quantity: item.quantity,
                unit_price: item.unit_price,
            })
        })
        .collect();

    Ok(OrderResponse {
        order_id: order.order_id,
        user: order.user_id,
        order_date: order.order_date,
        total_amount: order.total_amount,
        status: order.status,
        items,
    })
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"user": 1}))]
pub struct CheckoutRequest {
    /// Id of the user whose cart is checked out
    pub user: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItemResponse {
    pub order_item_id: i32,
    pub product: ProductResponse,
    pub quantity: i32,
    /// Price per unit when the order was placed
    #[schema(value_type = String, example = "19.99")]
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub order_id: i32,
    pub user: i32,
    pub order_date: DateTime<Utc>,
    #[schema(value_type = String, example = "39.98")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub items: Vec<OrderItemResponse>,
}
