use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;

use crate::controllers::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::response::ApiResponse;
use crate::services::user_roles::{
    self, AssignRolesRequest, RemoveRolesRequest, UserRolesResponse,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assign", post(assign))
        .route("/remove", post(remove))
        .route("/deactivate", post(deactivate))
}

/// Grant roles to a user.
#[utoipa::path(
    post,
    path = "/api/user-roles/assign",
    request_body = AssignRolesRequest,
    responses(
        (status = 200, description = "Refreshed role set", body = UserRolesResponse),
        (status = 404, description = "User or role not found"),
        (status = 409, description = "All requested roles already assigned"),
    ),
    security(("bearer_auth" = [])),
    tag = "user-roles"
)]
pub async fn assign(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<AssignRolesRequest>,
) -> Result<ApiResponse<UserRolesResponse>, ApiError> {
    Ok(ApiResponse::success(
        user_roles::assign_roles(&state.db, req).await?,
    ))
}

/// Remove role assignments outright.
#[utoipa::path(
    post,
    path = "/api/user-roles/remove",
    request_body = RemoveRolesRequest,
    responses(
        (status = 200, description = "Refreshed role set", body = UserRolesResponse),
        (status = 404, description = "User not found or roles not assigned"),
    ),
    security(("bearer_auth" = [])),
    tag = "user-roles"
)]
pub async fn remove(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<RemoveRolesRequest>,
) -> Result<ApiResponse<UserRolesResponse>, ApiError> {
    Ok(ApiResponse::success(
        user_roles::unassign_roles(&state.db, req).await?,
    ))
}

/// Revoke role assignments while keeping the rows for audit.
#[utoipa::path(
    post,
    path = "/api/user-roles/deactivate",
    request_body = RemoveRolesRequest,
    responses(
        (status = 200, description = "Refreshed role set", body = UserRolesResponse),
        (status = 404, description = "User not found or roles not assigned"),
    ),
    security(("bearer_auth" = [])),
    tag = "user-roles"
)]
pub async fn deactivate(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<RemoveRolesRequest>,
) -> Result<ApiResponse<UserRolesResponse>, ApiError> {
    Ok(ApiResponse::success(
        user_roles::deactivate_roles(&state.db, req).await?,
    ))
}
