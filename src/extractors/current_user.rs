use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use uuid::Uuid;

use crate::auth;
use crate::controllers::AppState;
use crate::error::ApiError;
use crate::models::user;
use crate::services;

/// Extractor that validates the bearer token and resolves the
/// authenticated user.
///
/// Fails closed: a token whose subject no longer exists, or whose account
/// has been deactivated, is rejected even if the signature is valid.
///
/// Usage in handlers:
/// ```rust,ignore
/// async fn my_handler(CurrentUser(user): CurrentUser) -> impl IntoResponse {
///     // user.password stays internal; convert to UserResponse before returning
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub user::Model);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let claims = auth::validate_token(token, &state.config.jwt_secret)?;

        let user_id: Uuid = claims
            .sub
            .parse()
            .map_err(|_| ApiError::Unauthorized("Invalid user ID in token".to_string()))?;

        let user = services::auth::validate_user(&state.db, user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

        Ok(CurrentUser(user))
    }
}
