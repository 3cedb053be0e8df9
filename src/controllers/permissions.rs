use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use uuid::Uuid;

use crate::controllers::AppState;
use crate::error::ApiError;
use crate::extractors::{CurrentUser, Page};
use crate::models::permission::PermissionResponse;
use crate::response::{ApiResponse, Paginated};
use crate::services::permissions::{
    self, CreatePermissionRequest, PermissionFilter, UpdatePermissionRequest,
};
use crate::services::role_permissions::{self, PermissionRolesResponse};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/active", get(find_active))
        .route("/resources", get(unique_resources))
        .route("/actions", get(unique_actions))
        .route("/{id}", get(find_one).patch(update).delete(remove))
        .route("/{id}/roles", get(roles_of))
}

/// List permissions with pagination and optional filters, ordered by
/// (resource, action).
#[utoipa::path(
    get,
    path = "/api/permissions",
    params(PermissionFilter),
    responses((status = 200, description = "One page of permissions")),
    security(("bearer_auth" = [])),
    tag = "permissions"
)]
pub async fn list(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(filter): Query<PermissionFilter>,
    page: Page,
) -> Result<ApiResponse<Paginated<PermissionResponse>>, ApiError> {
    Ok(ApiResponse::success(
        permissions::list(&state.db, filter, page).await?,
    ))
}

/// Create a permission.
#[utoipa::path(
    post,
    path = "/api/permissions",
    request_body = CreatePermissionRequest,
    responses(
        (status = 201, description = "Permission created", body = PermissionResponse),
        (status = 409, description = "Name or (resource, action) already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "permissions"
)]
pub async fn create(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Json(req): Json<CreatePermissionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PermissionResponse>>), ApiError> {
    let permission = permissions::create(&state.db, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(permission.into())),
    ))
}

/// All active permissions ordered by (resource, action).
#[utoipa::path(
    get,
    path = "/api/permissions/active",
    responses((status = 200, description = "Active permissions")),
    security(("bearer_auth" = [])),
    tag = "permissions"
)]
pub async fn find_active(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<PermissionResponse>>, ApiError> {
    Ok(ApiResponse::success(
        permissions::find_active(&state.db).await?,
    ))
}

/// Distinct resource names.
#[utoipa::path(
    get,
    path = "/api/permissions/resources",
    responses((status = 200, description = "Distinct resources")),
    security(("bearer_auth" = [])),
    tag = "permissions"
)]
pub async fn unique_resources(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<String>>, ApiError> {
    Ok(ApiResponse::success(
        permissions::unique_resources(&state.db).await?,
    ))
}

/// Distinct action names.
#[utoipa::path(
    get,
    path = "/api/permissions/actions",
    responses((status = 200, description = "Distinct actions")),
    security(("bearer_auth" = [])),
    tag = "permissions"
)]
pub async fn unique_actions(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<String>>, ApiError> {
    Ok(ApiResponse::success(
        permissions::unique_actions(&state.db).await?,
    ))
}

/// Fetch a single permission with its role counter.
#[utoipa::path(
    get,
    path = "/api/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission", body = PermissionResponse),
        (status = 404, description = "Permission not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "permissions"
)]
pub async fn find_one(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<PermissionResponse>, ApiError> {
    Ok(ApiResponse::success(
        permissions::find_one(&state.db, id).await?,
    ))
}

/// Update a permission; the (resource, action) pair stays unique.
#[utoipa::path(
    patch,
    path = "/api/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    request_body = UpdatePermissionRequest,
    responses(
        (status = 200, description = "Updated permission", body = PermissionResponse),
        (status = 404, description = "Permission not found"),
        (status = 409, description = "Name or (resource, action) already taken"),
    ),
    security(("bearer_auth" = [])),
    tag = "permissions"
)]
pub async fn update(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdatePermissionRequest>,
) -> Result<ApiResponse<PermissionResponse>, ApiError> {
    let permission = permissions::update(&state.db, id, req).await?;
    Ok(ApiResponse::success(permission.into()))
}

/// Deactivate a permission. Fails while active grants reference it.
#[utoipa::path(
    delete,
    path = "/api/permissions/{id}",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 204, description = "Permission deactivated"),
        (status = 400, description = "Permission still granted to active roles"),
        (status = 404, description = "Permission not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "permissions"
)]
pub async fn remove(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    permissions::deactivate(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Active roles granted this permission.
#[utoipa::path(
    get,
    path = "/api/permissions/{id}/roles",
    params(("id" = Uuid, Path, description = "Permission ID")),
    responses(
        (status = 200, description = "Permission with its active roles", body = PermissionRolesResponse),
        (status = 404, description = "Permission not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "role-permissions"
)]
pub async fn roles_of(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<PermissionRolesResponse>, ApiError> {
    Ok(ApiResponse::success(
        role_permissions::roles_by_permission(&state.db, id).await?,
    ))
}
