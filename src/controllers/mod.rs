pub mod auth;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod user_roles;
pub mod users;

use std::sync::Arc;

use axum::Router;
use sea_orm::DatabaseConnection;

use crate::config::Config;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
}

/// Assemble every controller under the `/api` prefix.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::routes())
        .nest("/api/users", users::routes())
        .nest("/api/roles", roles::routes())
        .nest("/api/permissions", permissions::routes())
        .nest("/api/user-roles", user_roles::routes())
        .nest("/api/role-permissions", role_permissions::routes())
}
