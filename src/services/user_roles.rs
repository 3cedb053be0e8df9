use std::collections::HashSet;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, validate_request};
use crate::models::role::{self, RoleResponse};
use crate::models::user::{self, UserResponse};
use crate::models::user_role;
use crate::services::users;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignRolesRequest {
    pub user_id: Uuid,

    #[validate(length(min = 1, message = "at least one role ID is required"))]
    pub role_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RemoveRolesRequest {
    pub user_id: Uuid,

    #[validate(length(min = 1, message = "at least one role ID is required"))]
    pub role_ids: Vec<Uuid>,
}

/// Body of the PUT replace endpoint; an empty list clears every assignment.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplaceRolesRequest {
    pub role_ids: Vec<Uuid>,
}

/// A user together with their effective roles.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserRolesResponse {
    pub user: UserResponse,
    pub roles: Vec<RoleResponse>,
}

/// A role together with the active users holding it.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoleUsersResponse {
    pub role: RoleResponse,
    pub users: Vec<UserResponse>,
}

/// Grant roles to a user, skipping nothing: every requested role must be an
/// active role, and at least one must not already be assigned.
pub async fn assign_roles(
    db: &DatabaseConnection,
    req: AssignRolesRequest,
) -> Result<UserRolesResponse, ApiError> {
    validate_request(&req)?;

    let user = users::find_one(db, req.user_id).await?;
    let role_ids = dedup(req.role_ids);

    ensure_active_roles(db, &role_ids).await?;

    let existing: HashSet<Uuid> = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user.id))
        .filter(user_role::Column::RoleId.is_in(role_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.role_id)
        .collect();

    let new_ids: Vec<Uuid> = role_ids
        .into_iter()
        .filter(|id| !existing.contains(id))
        .collect();
    if new_ids.is_empty() {
        return Err(ApiError::Conflict(
            "All requested roles are already assigned to the user".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let rows: Vec<user_role::ActiveModel> = new_ids
        .into_iter()
        .map(|role_id| user_role::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.id),
            role_id: Set(role_id),
            is_active: Set(true),
            assigned_at: Set(now),
        })
        .collect();

    let txn = db.begin().await?;
    user_role::Entity::insert_many(rows).exec(&txn).await?;
    txn.commit().await?;

    user_roles_view(db, user.id).await
}

/// Hard removal: the matched assignment rows are deleted outright.
pub async fn unassign_roles(
    db: &DatabaseConnection,
    req: RemoveRolesRequest,
) -> Result<UserRolesResponse, ApiError> {
    validate_request(&req)?;

    let user = users::find_one(db, req.user_id).await?;
    let role_ids = dedup(req.role_ids);

    let matched = match_assignments(db, user.id, &role_ids, false).await?;
    let ids: Vec<Uuid> = matched.iter().map(|link| link.id).collect();

    user_role::Entity::delete_many()
        .filter(user_role::Column::Id.is_in(ids))
        .exec(db)
        .await?;

    user_roles_view(db, user.id).await
}

/// Soft removal: the matched assignment rows stay but stop being effective.
pub async fn deactivate_roles(
    db: &DatabaseConnection,
    req: RemoveRolesRequest,
) -> Result<UserRolesResponse, ApiError> {
    validate_request(&req)?;

    let user = users::find_one(db, req.user_id).await?;
    let role_ids = dedup(req.role_ids);

    let matched = match_assignments(db, user.id, &role_ids, true).await?;
    let ids: Vec<Uuid> = matched.iter().map(|link| link.id).collect();

    user_role::Entity::update_many()
        .col_expr(user_role::Column::IsActive, Expr::value(false))
        .filter(user_role::Column::Id.is_in(ids))
        .exec(db)
        .await?;

    user_roles_view(db, user.id).await
}

/// Replace a user's entire role set in one transaction. An empty `role_ids`
/// clears all assignments.
pub async fn replace_roles(
    db: &DatabaseConnection,
    user_id: Uuid,
    role_ids: Vec<Uuid>,
) -> Result<UserRolesResponse, ApiError> {
    let user = users::find_one(db, user_id).await?;
    let role_ids = dedup(role_ids);

    ensure_active_roles(db, &role_ids).await?;

    let txn = db.begin().await?;

    user_role::Entity::delete_many()
        .filter(user_role::Column::UserId.eq(user.id))
        .exec(&txn)
        .await?;

    if !role_ids.is_empty() {
        let now = Utc::now().naive_utc();
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
    }

    txn.commit().await?;

    user_roles_view(db, user.id).await
}

/// The user's effective roles: assignment row active AND role active.
pub async fn effective_roles(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<Vec<role::Model>, ApiError> {
    let links = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::IsActive.eq(true))
        .find_also_related(role::Entity)
        .all(db)
        .await?;

    Ok(links
        .into_iter()
        .filter_map(|(_, role)| role)
        .filter(|role| role.is_active)
        .collect())
}

/// Whether the user effectively holds a role with this exact name.
pub async fn has_role(
    db: &DatabaseConnection,
    user_id: Uuid,
    role_name: &str,
) -> Result<bool, ApiError> {
    let count = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::IsActive.eq(true))
        .inner_join(role::Entity)
        .filter(role::Column::Name.eq(role_name))
        .filter(role::Column::IsActive.eq(true))
        .count(db)
        .await?;

    Ok(count > 0)
}

/// A user plus their effective role set, as returned by every assignment
/// mutation and the GET endpoint.
pub async fn user_roles_view(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> Result<UserRolesResponse, ApiError> {
    let user = users::find_one(db, user_id).await?;
    let roles = effective_roles(db, user_id).await?;

    Ok(UserRolesResponse {
        user: user.into(),
        roles: roles.into_iter().map(RoleResponse::from).collect(),
    })
}

/// Reverse lookup: the active users whose assignment to this role is active.
pub async fn users_by_role(
    db: &DatabaseConnection,
    role_id: Uuid,
) -> Result<RoleUsersResponse, ApiError> {
    let role = role::Entity::find_by_id(role_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role with ID {} not found", role_id)))?;

    let links = user_role::Entity::find()
        .filter(user_role::Column::RoleId.eq(role_id))
        .filter(user_role::Column::IsActive.eq(true))
        .find_also_related(user::Entity)
        .all(db)
        .await?;

    let users: Vec<UserResponse> = links
        .into_iter()
        .filter_map(|(_, user)| user)
        .filter(|user| user.is_active)
        .map(UserResponse::from)
        .collect();

    Ok(RoleUsersResponse {
        role: role.into(),
        users,
    })
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Every id must name an existing, active role; otherwise NotFound listing
/// the offenders.
pub(crate) async fn ensure_active_roles(
    db: &DatabaseConnection,
    role_ids: &[Uuid],
) -> Result<(), ApiError> {
    if role_ids.is_empty() {
        return Ok(());
    }

    let found: HashSet<Uuid> = role::Entity::find()
        .filter(role::Column::Id.is_in(role_ids.to_vec()))
        .filter(role::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|role| role.id)
        .collect();

    let missing: Vec<String> = role_ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::NotFound(format!(
            "The following roles were not found or are inactive: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

/// Resolve the assignment rows a removal targets. Zero matches and partial
/// matches are both NotFound, the latter naming the unmatched ids.
async fn match_assignments(
    db: &DatabaseConnection,
    user_id: Uuid,
    role_ids: &[Uuid],
    active_only: bool,
) -> Result<Vec<user_role::Model>, ApiError> {
    let mut query = user_role::Entity::find()
        .filter(user_role::Column::UserId.eq(user_id))
        .filter(user_role::Column::RoleId.is_in(role_ids.to_vec()));
    if active_only {
        query = query.filter(user_role::Column::IsActive.eq(true));
    }
    let matched = query.all(db).await?;

    if matched.is_empty() {
        return Err(ApiError::NotFound(
            "None of the specified roles are assigned to the user".to_string(),
        ));
    }
    if matched.len() != role_ids.len() {
        let matched_ids: HashSet<Uuid> = matched.iter().map(|link| link.role_id).collect();
        let unmatched: Vec<String> = role_ids
            .iter()
            .filter(|id| !matched_ids.contains(id))
            .map(ToString::to_string)
            .collect();
        return Err(ApiError::NotFound(format!(
            "The following roles are not assigned to the user: {}",
            unmatched.join(", ")
        )));
    }

    Ok(matched)
}
