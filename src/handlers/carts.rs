use super::common::{no_content_response, success_response};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::carts::{parse_quantity, CartResponse, UpdateQuantityRequest},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::Value;

/// Get the user's cart, creating it if needed
#[utoipa::path(
    get,
    path = "/users/{user_id}/cart/",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Cart with its items", body = CartResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.carts.get_cart(user_id).await?;
    Ok(success_response(cart))
}

/// Add one unit of a product to the user's cart
#[utoipa::path(
    post,
    path = "/users/{user_id}/cart/add/{product_id}/",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("product_id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 404, description = "User or product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let cart = state.services.carts.add_item(user_id, product_id).await?;
    Ok(success_response(cart))
}

/// Set the quantity of a cart line; zero or less removes it
#[utoipa::path(
    put,
    path = "/users/{user_id}/cart/update/{product_id}/",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("product_id" = i32, Path, description = "Product ID")
    ),
    request_body = UpdateQuantityRequest,
    responses(
        (status = 200, description = "Updated cart", body = CartResponse),
        (status = 400, description = "Missing or non-integer quantity", body = crate::errors::ErrorResponse),
        (status = 404, description = "User, cart or cart item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(i32, i32)>,
    body: Option<Json<Value>>,
) -> Result<impl IntoResponse, ApiError> {
    let quantity = parse_quantity(body.as_ref().map(|Json(value)| value))?;
    let cart = state
        .services
        .carts
        .update_item(user_id, product_id, quantity)
        .await?;
    Ok(success_response(cart))
}

/// Remove a product from the user's cart
#[utoipa::path(
    delete,
    path = "/users/{user_id}/cart/remove/{product_id}/",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("product_id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 204, description = "Item removed"),
        (status = 404, description = "User, cart or cart item not found", body = crate::errors::ErrorResponse)
    ),
    tag = "cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .services
        .carts
        .remove_item(user_id, product_id)
        .await?;
    Ok(no_content_response())
}

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:user_id/cart/", get(get_cart))
        .route("/users/:user_id/cart/add/:product_id/", post(add_to_cart))
        .route(
            "/users/:user_id/cart/update/:product_id/",
            put(update_cart_item),
        )
        .route(
            "/users/:user_id/cart/remove/:product_id/",
            delete(remove_from_cart),
        )
}
