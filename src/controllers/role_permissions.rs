use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::post;

use crate::controllers::AppState;
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::response::ApiResponse;
use crate::services::role_permissions::{
    self, AssignPermissionsRequest, RemovePermissionsRequest, RolePermissionsResponse,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/assign", post(assign))
        .route("/remove", post(remove))
        .route("/deactivate", post(deactivate))
}

/// Grant permissions to a role.
#[utoipa::path(
    post,
    path = "/api/role-permissions/assign",
    request_body = AssignPermissionsRequest,
    responses(
        (status = 200, description = "Refreshed permission set", body = RolePermissionsResponse),
        (status = 404, description = "Role or permission not found"),
        (status = 409, description = "All requested permissions already assigned"),
    ),
    security(("bearer_auth" = [])),
    tag = "role-permissions"
)]
pub async fn assign(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<AssignPermissionsRequest>,
) -> Result<ApiResponse<RolePermissionsResponse>, ApiError> {
    Ok(ApiResponse::success(
        role_permissions::assign_permissions(&state.db, req).await?,
    ))
}

/// Remove permission grants outright.
#[utoipa::path(
    post,
    path = "/api/role-permissions/remove",
    request_body = RemovePermissionsRequest,
    responses(
        (status = 200, description = "Refreshed permission set", body = RolePermissionsResponse),
        (status = 404, description = "Role not found or permissions not assigned"),
    ),
    security(("bearer_auth" = [])),
    tag = "role-permissions"
)]
pub async fn remove(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<RemovePermissionsRequest>,
) -> Result<ApiResponse<RolePermissionsResponse>, ApiError> {
    Ok(ApiResponse::success(
        role_permissions::unassign_permissions(&state.db, req).await?,
    ))
}

/// Revoke permission grants while keeping the rows for audit.
#[utoipa::path(
    post,
    path = "/api/role-permissions/deactivate",
    request_body = RemovePermissionsRequest,
    responses(
        (status = 200, description = "Refreshed permission set", body = RolePermissionsResponse),
        (status = 404, description = "Role not found or permissions not assigned"),
    ),
    security(("bearer_auth" = [])),
    tag = "role-permissions"
)]
pub async fn deactivate(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<RemovePermissionsRequest>,
) -> Result<ApiResponse<RolePermissionsResponse>, ApiError> {
    Ok(ApiResponse::success(
        role_permissions::deactivate_permissions(&state.db, req).await?,
    ))
}
