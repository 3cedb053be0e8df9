use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;

use crate::controllers::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::models::user::UserResponse;
use crate::response::ApiResponse;
use crate::services::auth::{self, AuthResponse, LoginRequest, RegisterRequest};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/profile", get(profile))
}

/// Register a new user account.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let session = auth::register(&state.db, &state.config, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

/// Log in with email and password.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<ApiResponse<AuthResponse>, ApiError> {
    let session = auth::login(&state.db, &state.config, req).await?;
    Ok(ApiResponse::success(session))
}

/// Current authenticated user.
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
pub async fn profile(CurrentUser(user): CurrentUser) -> ApiResponse<UserResponse> {
    ApiResponse::success(user.into())
}
