use super::common::{created_response, success_response};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::behavior::{BehaviorResponse, CreateBehaviorInput, MessageResponse},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};

/// List behavior log entries
#[utoipa::path(
    get,
    path = "/user-behavior/",
    responses(
        (status = 200, description = "Entries ordered by id", body = [BehaviorResponse])
    ),
    tag = "behavior"
)]
pub async fn list_behaviors(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let entries = state.services.behavior.list_behaviors().await?;
    Ok(success_response(entries))
}

/// Record a behavior log entry
#[utoipa::path(
    post,
    path = "/user-behavior/",
    request_body = CreateBehaviorInput,
    responses(
        (status = 201, description = "Entry recorded", body = BehaviorResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "User or product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "behavior"
)]
pub async fn create_behavior(
    State(state): State<AppState>,
    Json(payload): Json<CreateBehaviorInput>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.services.behavior.create_behavior(payload).await?;
    Ok(created_response(entry))
}

/// Log that a user viewed a product
#[utoipa::path(
    post,
    path = "/users/{user_id}/log-view/{product_id}/",
    params(
        ("user_id" = i32, Path, description = "User ID"),
        ("product_id" = i32, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "View logged", body = MessageResponse),
        (status = 404, description = "User or Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "behavior"
)]
pub async fn log_product_view(
    State(state): State<AppState>,
    Path((user_id, product_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.behavior.log_view(user_id, product_id).await?;
    Ok(success_response(MessageResponse {
        message: "Product view logged successfully.".to_string(),
    }))
}

/// Creates the router for behavior log endpoints
pub fn behavior_routes() -> Router<AppState> {
    Router::new()
        .route("/user-behavior/", get(list_behaviors).post(create_behavior))
        .route(
            "/users/:user_id/log-view/:product_id/",
            post(log_product_view),
        )
}
