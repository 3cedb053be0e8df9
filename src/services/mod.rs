pub mod auth;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod user_roles;
pub mod users;

/// Role granted at registration when the caller supplies none.
pub const DEFAULT_ROLE: &str = "usuario";

/// Role required to log in when `Config::require_admin_role` is set.
pub const ADMIN_ROLE: &str = "administrador";
