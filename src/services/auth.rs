use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{create_token, hash_password, verify_password};
use crate::config::Config;
use crate::error::{ApiError, validate_request};
use crate::models::user::{self, UserResponse};
use crate::models::{role, user_role};
use crate::services::{ADMIN_ROLE, DEFAULT_ROLE, user_roles};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,

    pub phone: Option<String>,

    /// Roles to grant at registration; omitted means the default role.
    pub role_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Issued session: the password-stripped user plus a signed token.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// Create an account and grant its initial roles in one transaction.
///
/// Caller-supplied role ids must all be active roles; with none supplied the
/// default role is granted, created on first use.
pub async fn register(
    db: &DatabaseConnection,
    config: &Config,
    req: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    validate_request(&req)?;

    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&req.email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!(
            "User with email '{}' already exists",
            req.email
        )));
    }

    let role_ids = match req.role_ids.filter(|ids| !ids.is_empty()) {
        Some(ids) => {
            let mut seen = HashSet::new();
            let ids: Vec<Uuid> = ids.into_iter().filter(|id| seen.insert(*id)).collect();
            user_roles::ensure_active_roles(db, &ids).await?;
            ids
        }
        None => vec![default_role(db).await?.id],
    };

    let now = Utc::now().naive_utc();
    let user_model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name),
        email: Set(req.email),
        password: Set(hash_password(&req.password)?),
        phone: Set(req.phone),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let txn = db.begin().await?;

    let user = user_model.insert(&txn).await?;

    let rows: Vec<user_role::ActiveModel> = role_ids
        .into_iter()
        .map(|role_id| user_role::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            role_id: Set(role_id),
            is_active: Set(true),
            assigned_at: Set(now),
        })
        .collect();
    user_role::Entity::insert_many(rows).exec(&txn).await?;

    txn.commit().await?;

    let token = create_token(
        user.id,
        &user.email,
        None,
        &config.jwt_secret,
        config.jwt_expiry_hours,
    )?;

    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

/// Verify credentials and issue a token carrying the effective role names.
///
/// Unknown email, wrong password and a deactivated account all fail with the
/// same message so the response does not reveal which check failed.
pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    req: LoginRequest,
) -> Result<AuthResponse, ApiError> {
    validate_request(&req)?;

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = user::Entity::find()
        .filter(user::Column::Email.eq(&req.email))
        .one(db)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&req.password, &user.password)? {
        return Err(invalid());
    }
    if !user.is_active {
        return Err(invalid());
    }

    if config.require_admin_role && !user_roles::has_role(db, user.id, ADMIN_ROLE).await? {
        return Err(ApiError::Unauthorized(
            "You do not have permission to access".to_string(),
        ));
    }

    let roles: Vec<String> = user_roles::effective_roles(db, user.id)
        .await?
        .into_iter()
        .map(|role| role.name)
        .collect();

    let token = create_token(
        user.id,
        &user.email,
        Some(roles),
        &config.jwt_secret,
        config.jwt_expiry_hours,
    )?;

    Ok(AuthResponse {
        user: user.into(),
        token,
    })
}

/// Resolve a token subject to a live account. Returns None when the user is
/// gone or deactivated, so stale tokens fail closed.
pub async fn validate_user(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Option<user::Model>, ApiError> {
    let user = user::Entity::find_by_id(user_id).one(db).await?;
    Ok(user.filter(|u| u.is_active))
}

/// Get or create the default registration role.
async fn default_role(db: &DatabaseConnection) -> Result<role::Model, ApiError> {
    if let Some(existing) = role::Entity::find()
        .filter(role::Column::Name.eq(DEFAULT_ROLE))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let now = Utc::now().naive_utc();
    let model = role::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(DEFAULT_ROLE.to_string()),
        description: Set(Some("Default role for new users".to_string())),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(db).await?)
}
