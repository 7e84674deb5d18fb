use super::common::{created_response, no_content_response, success_response};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::products::{ProductInput, ProductPatch, ProductResponse},
};
use axum::{
    extract::{Json, Path, State},
    http::{HeaderName, HeaderValue},
    response::IntoResponse,
    routing::get,
    Router,
};

pub const RECOMMENDATION_STRATEGY_HEADER: &str = "x-recommendation-strategy";

/// List all products
#[utoipa::path(
    get,
    path = "/products/",
    responses(
        (status = 200, description = "Products ordered by id", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let products = state.services.products.list_products().await?;
    Ok(success_response(products))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/products/",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.create_product(payload).await?;
    Ok(created_response(product))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/{product_id}/",
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product returned", body = ProductResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state.services.products.get_product(product_id).await?;
    Ok(success_response(product))
}

/// Replace a product
#[utoipa::path(
    put,
    path = "/products/{product_id}/",
    params(("product_id" = i32, Path, description = "Product ID")),
    request_body = ProductInput,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(payload): Json<ProductInput>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .replace_product(product_id, payload)
        .await?;
    Ok(success_response(product))
}

/// Partially update a product
#[utoipa::path(
    patch,
    path = "/products/{product_id}/",
    params(("product_id" = i32, Path, description = "Product ID")),
    request_body = ProductPatch,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn patch_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    Json(payload): Json<ProductPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let product = state
        .services
        .products
        .patch_product(product_id, payload)
        .await?;
    Ok(success_response(product))
}

/// Delete a product
#[utoipa::path(
    delete,
    path = "/products/{product_id}/",
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.products.delete_product(product_id).await?;
    Ok(no_content_response())
}

/// Recommend up to ten products related to the given one
#[utoipa::path(
    get,
    path = "/products/{product_id}/recommendations/",
    params(("product_id" = i32, Path, description = "Product to base recommendations on")),
    responses(
        (status = 200, description = "Recommended products, best first", body = [ProductResponse],
            headers(("X-Recommendation-Strategy" = String, description = "similar, trending, recent or none"))
        ),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "recommendations"
)]
pub async fn get_recommendations(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let recommendations = state.services.recommendations.recommend(product_id).await?;

    let products: Vec<ProductResponse> = recommendations
        .products
        .into_iter()
        .map(ProductResponse::from)
        .collect();

    Ok((
        [(
            HeaderName::from_static(RECOMMENDATION_STRATEGY_HEADER),
            HeaderValue::from_static(recommendations.strategy.as_str()),
        )],
        success_response(products),
    ))
}

/// Creates the router for product endpoints
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products/", get(list_products).post(create_product))
        .route(
            "/products/:product_id/",
            get(get_product)
                .put(update_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .route(
            "/products/:product_id/recommendations/",
            get(get_recommendations),
        )
}
