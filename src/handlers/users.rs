use super::common::{created_response, no_content_response, success_response};
use crate::{
    errors::ApiError,
    handlers::AppState,
    services::users::{CreateUserInput, UpdateUserInput, UserResponse},
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};

/// List all users
#[utoipa::path(
    get,
    path = "/users/",
    responses(
        (status = 200, description = "Users ordered by id", body = [UserResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let users = state.services.users.list_users().await?;
    Ok(success_response(users))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users/",
    request_body = CreateUserInput,
    responses(
        (status = 201, description = "User created", body = UserResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.create_user(payload).await?;
    Ok(created_response(user))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/users/{user_id}/",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User returned", body = UserResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.get_user(user_id).await?;
    Ok(success_response(user))
}

/// Replace a user
#[utoipa::path(
    put,
    path = "/users/{user_id}/",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = CreateUserInput,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<CreateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.replace_user(user_id, payload).await?;
    Ok(success_response(user))
}

/// Partially update a user
#[utoipa::path(
    patch,
    path = "/users/{user_id}/",
    params(("user_id" = i32, Path, description = "User ID")),
    request_body = UpdateUserInput,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid request", body = crate::errors::ErrorResponse),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Email already registered", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn patch_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserInput>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.services.users.patch_user(user_id, payload).await?;
    Ok(success_response(user))
}

/// Delete a user and everything they own
#[utoipa::path(
    delete,
    path = "/users/{user_id}/",
    params(("user_id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "Not found", body = crate::errors::ErrorResponse)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    state.services.users.delete_user(user_id).await?;
    Ok(no_content_response())
}

/// Creates the router for user endpoints
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(list_users).post(create_user))
        .route(
            "/users/:user_id/",
            get(get_user)
                .put(update_user)
                .patch(patch_user)
                .delete(delete_user),
        )
}
