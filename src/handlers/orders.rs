use super::common::{created_response, success_response};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::orders::{CheckoutRequest, OrderResponse},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// List all orders with their items
#[utoipa::path(
    get,
    path = "/orders/",
    responses(
        (status = 200, description = "Orders ordered by id", body = [OrderResponse])
    ),
    tag = "orders"
)]
pub async fn list_orders(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let orders = state.services.orders.list_orders().await?;
    Ok(success_response(orders))
}

/// Check out a user's cart into a new order
#[utoipa::path(
    post,
    path = "/orders/",
    request_body = CheckoutRequest,
    responses(
        (status = 201, description = "Order created", body = OrderResponse),
        (status = 400, description = "Cart is empty", body = crate::errors::ErrorResponse),
        (status = 404, description = "User or cart not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.services.orders.checkout(payload.user).await?;
    Ok(created_response(order))
}

/// Get an order with its items
#[utoipa::path(
    get,
    path = "/orders/{order_id}/",
    params(("order_id" = i32, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order returned", body = OrderResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let order = state.services.orders.get_order(order_id).await?;
    Ok(success_response(order))
}

/// Creates the router for order endpoints
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/", get(list_orders).post(create_order))
        .route("/orders/:order_id/", get(get_order))
}
