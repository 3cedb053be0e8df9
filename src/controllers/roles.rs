use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::controllers::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentUser, Page};
use crate::models::permission::PermissionResponse;
use crate::models::role::RoleResponse;
use crate::response::{ApiResponse, Paginated};
use crate::services::role_permissions::{
    self, ReplacePermissionsRequest, RolePermissionsResponse,
};
use crate::services::roles::{self, CreateRoleRequest, RoleFilter, UpdateRoleRequest};
use crate::services::user_roles::{self, RoleUsersResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/active", get(find_active))
        .route("/{id}", get(find_one).patch(update).delete(remove))
        .route("/{id}/users", get(users_of))
        .route("/{id}/permissions", get(permissions_of).put(replace_permissions))
        .route("/{id}/permissions/by-resource", get(permissions_by_resource))
}

/// List roles with pagination, optional search and active-flag filters, and
/// join counters.
#[utoipa::path(
    get,
    path = "/api/roles",
    params(RoleFilter),
    responses((status = 200, description = "One page of roles")),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn list(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<RoleFilter>,
    page: Page,
) -> Result<ApiResponse<Paginated<RoleResponse>>, ApiError> {
    Ok(ApiResponse::success(
        roles::list(&state.db, filter, page).await?,
    ))
}

/// Create a role.
#[utoipa::path(
    post,
    path = "/api/roles",
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
        (status = 409, description = "Role name already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn create(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RoleResponse>>), ApiError> {
    let role = roles::create(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(role.into()))))
}

/// All active roles, name ascending.
#[utoipa::path(
    get,
    path = "/api/roles/active",
    responses((status = 200, description = "Active roles")),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn find_active(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<RoleResponse>>, ApiError> {
    Ok(ApiResponse::success(roles::find_active(&state.db).await?))
}

/// Fetch a single role with its join counters.
#[utoipa::path(
    get,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role", body = RoleResponse),
        (status = 404, description = "Role not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn find_one(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<RoleResponse>, ApiError> {
    Ok(ApiResponse::success(roles::find_one(&state.db, id).await?))
}

/// Update a role's name or description.
#[utoipa::path(
    patch,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated role", body = RoleResponse),
        (status = 404, description = "Role not found"),
        (status = 409, description = "Role name already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn update(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<ApiResponse<RoleResponse>, ApiError> {
    let role = roles::update(&state.db, id, req).await?;
    Ok(ApiResponse::success(role.into()))
}

/// Deactivate a role. Fails while active user assignments reference it.
#[utoipa::path(
    delete,
    path = "/api/roles/{id}",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deactivated"),
        (status = 400, description = "Role still assigned to active users"),
        (status = 404, description = "Role not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "roles"
)]
pub async fn remove(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    roles::deactivate(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Active users holding this role.
#[utoipa::path(
    get,
    path = "/api/roles/{id}/users",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role with its active users", body = RoleUsersResponse),
        (status = 404, description = "Role not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "user-roles"
)]
pub async fn users_of(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<RoleUsersResponse>, ApiError> {
    Ok(ApiResponse::success(
        user_roles::users_by_role(&state.db, id).await?,
    ))
}

/// A role's effective permissions.
#[utoipa::path(
    get,
    path = "/api/roles/{id}/permissions",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role with effective permissions", body = RolePermissionsResponse),
        (status = 404, description = "Role not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "role-permissions"
)]
pub async fn permissions_of(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<RolePermissionsResponse>, ApiError> {
    Ok(ApiResponse::success(
        role_permissions::role_permissions_view(&state.db, id).await?,
    ))
}

/// Replace a role's entire permission set; an empty list revokes everything.
#[utoipa::path(
    put,
    path = "/api/roles/{id}/permissions",
    params(("id" = Uuid, Path, description = "Role ID")),
    request_body = ReplacePermissionsRequest,
    responses(
        (status = 200, description = "Refreshed permission set", body = RolePermissionsResponse),
        (status = 404, description = "Role or permission not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "role-permissions"
)]
pub async fn replace_permissions(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReplacePermissionsRequest>,
) -> Result<ApiResponse<RolePermissionsResponse>, ApiError> {
    Ok(ApiResponse::success(
        role_permissions::replace_permissions(&state.db, id, req.permission_ids).await?,
    ))
}

/// A role's effective permissions grouped by resource.
#[utoipa::path(
    get,
    path = "/api/roles/{id}/permissions/by-resource",
    params(("id" = Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Permissions keyed by resource"),
        (status = 404, description = "Role not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "role-permissions"
)]
pub async fn permissions_by_resource(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<BTreeMap<String, Vec<PermissionResponse>>>, ApiError> {
    Ok(ApiResponse::success(
        role_permissions::permissions_by_resource(&state.db, id).await?,
    ))
}
