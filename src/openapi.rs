use utoipa::OpenApi;

use crate::error::FieldError;
use crate::models::permission::PermissionResponse;
use crate::models::role::RoleResponse;
use crate::models::user::UserResponse;
use crate::services::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::services::permissions::{CreatePermissionRequest, UpdatePermissionRequest};
use crate::services::role_permissions::{
    AssignPermissionsRequest, PermissionRolesResponse, RemovePermissionsRequest,
    ReplacePermissionsRequest, RolePermissionsResponse,
};
use crate::services::roles::{CreateRoleRequest, UpdateRoleRequest};
use crate::services::user_roles::{
    AssignRolesRequest, RemoveRolesRequest, ReplaceRolesRequest, RoleUsersResponse,
    UserRolesResponse,
};
use crate::services::users::{CreateUserRequest, UpdateUserRequest};

/// Auto-generated OpenAPI documentation for custodia.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Custodia API",
        version = "0.1.0",
        description = "Authentication and role-based access control service."
    ),
    paths(
        crate::controllers::auth::register,
        crate::controllers::auth::login,
        crate::controllers::auth::profile,
        crate::controllers::users::list,
        crate::controllers::users::create,
        crate::controllers::users::find_one,
        crate::controllers::users::update,
        crate::controllers::users::remove,
        crate::controllers::users::roles_of,
        crate::controllers::users::replace_roles,
        crate::controllers::roles::list,
        crate::controllers::roles::create,
        crate::controllers::roles::find_active,
        crate::controllers::roles::find_one,
        crate::controllers::roles::update,
        crate::controllers::roles::remove,
        crate::controllers::roles::users_of,
        crate::controllers::roles::permissions_of,
        crate::controllers::roles::replace_permissions,
        crate::controllers::roles::permissions_by_resource,
        crate::controllers::permissions::list,
        crate::controllers::permissions::create,
        crate::controllers::permissions::find_active,
        crate::controllers::permissions::unique_resources,
        crate::controllers::permissions::unique_actions,
        crate::controllers::permissions::find_one,
        crate::controllers::permissions::update,
        crate::controllers::permissions::remove,
        crate::controllers::permissions::roles_of,
        crate::controllers::user_roles::assign,
        crate::controllers::user_roles::remove,
        crate::controllers::user_roles::deactivate,
        crate::controllers::role_permissions::assign,
        crate::controllers::role_permissions::remove,
        crate::controllers::role_permissions::deactivate,
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            CreateUserRequest,
            UpdateUserRequest,
            UserResponse,
            CreateRoleRequest,
            UpdateRoleRequest,
            RoleResponse,
            CreatePermissionRequest,
            UpdatePermissionRequest,
            PermissionResponse,
            AssignRolesRequest,
            RemoveRolesRequest,
            ReplaceRolesRequest,
            UserRolesResponse,
            RoleUsersResponse,
            AssignPermissionsRequest,
            RemovePermissionsRequest,
            ReplacePermissionsRequest,
            RolePermissionsResponse,
            PermissionRolesResponse,
            FieldError,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and profile"),
        (name = "users", description = "User management"),
        (name = "roles", description = "Role management"),
        (name = "permissions", description = "Permission management"),
        (name = "user-roles", description = "User-role assignments"),
        (name = "role-permissions", description = "Role-permission grants")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Add JWT Bearer security scheme to the OpenAPI spec.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::Http::new(
                        utoipa::openapi::security::HttpAuthScheme::Bearer,
                    ),
                ),
            );
        }
    }
}
