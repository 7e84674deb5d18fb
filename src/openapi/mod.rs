use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "1.0.0",
        description = r#"
# Storefront API

CRUD backend for a small online store: users, products, carts, orders and
behavior logs, plus product recommendations.

## Recommendations

`GET /products/{product_id}/recommendations/` returns up to ten products.
Products in the same category come first, followed by products sharing a
brand or a tag. When nothing matches, the most purchased products are
returned, and failing that the newest ones. The `X-Recommendation-Strategy`
response header names the tier that produced the list.

## Error Handling

Errors share one body shape:

```json
{
  "error": "Product not found.",
  "request_id": "5b0f3c1e-6a53-4d5e-9a38-0f7f3c2b9d11",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "users", description = "User accounts"),
        (name = "products", description = "Product catalog"),
        (name = "recommendations", description = "Product recommendations"),
        (name = "cart", description = "Shopping carts"),
        (name = "orders", description = "Checkout and order history"),
        (name = "behavior", description = "User behavior logs"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::users::list_users,
        crate::handlers::users::create_user,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::patch_user,
        crate::handlers::users::delete_user,
        crate::handlers::products::list_products,
        crate::handlers::products::create_product,
        crate::handlers::products::get_product,
        crate::handlers::products::update_product,
        crate::handlers::products::patch_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::get_recommendations,
        crate::handlers::carts::get_cart,
        crate::handlers::carts::add_to_cart,
        crate::handlers::carts::update_cart_item,
        crate::handlers::carts::remove_from_cart,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::create_order,
        crate::handlers::orders::get_order,
        crate::handlers::behavior::list_behaviors,
        crate::handlers::behavior::create_behavior,
        crate::handlers::behavior::log_product_view,
        crate::health::health,
        crate::health::status,
    ),
    components(
        schemas(
            crate::services::users::CreateUserInput,
            crate::services::users::UpdateUserInput,
            crate::services::users::UserResponse,
            crate::services::products::ProductInput,
            crate::services::products::ProductPatch,
            crate::services::products::ProductResponse,
            crate::services::carts::CartResponse,
            crate::services::carts::CartItemResponse,
            crate::services::carts::UpdateQuantityRequest,
            crate::services::orders::CheckoutRequest,
            crate::services::orders::OrderResponse,
            crate::services::orders::OrderItemResponse,
            crate::services::behavior::CreateBehaviorInput,
            crate::services::behavior::BehaviorResponse,
            crate::services::behavior::MessageResponse,
            crate::entities::order::OrderStatus,
            crate::entities::user_behavior::ActionType,
            crate::health::HealthInfo,
            crate::health::StatusInfo,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_storefront_routes() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("Storefront API"));
        assert!(json.contains("/products/{product_id}/recommendations/"));
        assert!(json.contains("/users/{user_id}/cart/add/{product_id}/"));
        assert!(json.contains("ErrorResponse"));
    }
}
