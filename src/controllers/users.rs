use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use uuid::Uuid;

use crate::controllers::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentUser, Page};
use crate::models::user::UserResponse;
use crate::response::{ApiResponse, Paginated};
use crate::services::user_roles::{self, ReplaceRolesRequest, UserRolesResponse};
use crate::services::users::{self, CreateUserRequest, UpdateUserRequest, UserFilter};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(find_one).patch(update).delete(remove))
        .route("/{id}/roles", get(roles_of).put(replace_roles))
}

/// List users with pagination and optional filters.
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserFilter),
    responses((status = 200, description = "One page of users")),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<UserFilter>,
    page: Page,
) -> Result<ApiResponse<Paginated<UserResponse>>, ApiError> {
    Ok(ApiResponse::success(
        users::list(&state.db, filter, page).await?,
    ))
}

/// Create a user.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "Email already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    let user = users::create(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

/// Fetch a single user.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn find_one(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = users::find_one(&state.db, id).await?;
    Ok(ApiResponse::success(user.into()))
}

/// Update a user's fields; a supplied password is rehashed.
#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already registered"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = users::update(&state.db, id, req).await?;
    Ok(ApiResponse::success(user.into()))
}

/// Deactivate a user (soft delete).
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deactivated"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn remove(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    users::deactivate(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A user's effective roles.
#[utoipa::path(
    get,
    path = "/api/users/{id}/roles",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User with effective roles", body = UserRolesResponse),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "user-roles"
)]
pub async fn roles_of(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<UserRolesResponse>, ApiError> {
    Ok(ApiResponse::success(
        user_roles::user_roles_view(&state.db, id).await?,
    ))
}

/// Replace a user's entire role set; an empty list clears it.
#[utoipa::path(
    put,
    path = "/api/users/{id}/roles",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = ReplaceRolesRequest,
    responses(
        (status = 200, description = "Refreshed role set", body = UserRolesResponse),
        (status = 404, description = "User or role not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "user-roles"
)]
pub async fn replace_roles(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReplaceRolesRequest>,
) -> Result<ApiResponse<UserRolesResponse>, ApiError> {
    Ok(ApiResponse::success(
        user_roles::replace_roles(&state.db, id, req.role_ids).await?,
    ))
}
