use std::collections::{BTreeMap, HashSet};

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, validate_request};
use crate::models::permission::{self, PermissionResponse};
use crate::models::role::{self, RoleResponse};
use crate::models::role_permission;
use crate::services::permissions;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignPermissionsRequest {
    pub role_id: Uuid,

    #[validate(length(min = 1, message = "at least one permission ID is required"))]
    pub permission_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RemovePermissionsRequest {
    pub role_id: Uuid,

    #[validate(length(min = 1, message = "at least one permission ID is required"))]
    pub permission_ids: Vec<Uuid>,
}

/// Body of the PUT replace endpoint; an empty list revokes every grant.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplacePermissionsRequest {
    pub permission_ids: Vec<Uuid>,
}

/// A role together with its effective permissions.
#[derive(Debug, Serialize, ToSchema)]
pub struct RolePermissionsResponse {
    pub role: RoleResponse,
    pub permissions: Vec<PermissionResponse>,
}

/// A permission together with the active roles granted it.
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionRolesResponse {
    pub permission: PermissionResponse,
    pub roles: Vec<RoleResponse>,
}

/// Grant permissions to an active role. Every requested permission must be
/// an active permission, and at least one must not already be granted.
pub async fn assign_permissions(
    db: &DatabaseConnection,
    req: AssignPermissionsRequest,
) -> Result<RolePermissionsResponse, ApiError> {
    validate_request(&req)?;

    let role = find_active_role(db, req.role_id).await?;
    let permission_ids = dedup(req.permission_ids);

    ensure_active_permissions(db, &permission_ids).await?;

    let existing: HashSet<Uuid> = role_permission::Entity::find()
        .filter(role_permission::Column::RoleId.eq(role.id))
        .filter(role_permission::Column::PermissionId.is_in(permission_ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.permission_id)
        .collect();

    let new_ids: Vec<Uuid> = permission_ids
        .into_iter()
        .filter(|id| !existing.contains(id))
        .collect();
    if new_ids.is_empty() {
        return Err(ApiError::Conflict(
            "All requested permissions are already assigned to the role".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let rows: Vec<role_permission::ActiveModel> = new_ids
        .into_iter()
        .map(|permission_id| role_permission::ActiveModel {
            id: Set(Uuid::new_v4()),
            role_id: Set(role.id),
            permission_id: Set(permission_id),
            is_active: Set(true),
            assigned_at: Set(now),
        })
        .collect();

    let txn = db.begin().await?;
    role_permission::Entity::insert_many(rows).exec(&txn).await?;
    txn.commit().await?;

    role_permissions_view(db, role.id).await
}

/// Hard removal of grant rows. The role only has to exist; revoking from a
/// deactivated role is legal.
pub async fn unassign_permissions(
    db: &DatabaseConnection,
    req: RemovePermissionsRequest,
) -> Result<RolePermissionsResponse, ApiError> {
    validate_request(&req)?;

    let role = find_role(db, req.role_id).await?;
    let permission_ids = dedup(req.permission_ids);

    let matched = match_grants(db, role.id, &permission_ids, false).await?;
    let ids: Vec<Uuid> = matched.iter().map(|link| link.id).collect();

    role_permission::Entity::delete_many()
        .filter(role_permission::Column::Id.is_in(ids))
        .exec(db)
        .await?;

    role_permissions_view(db, role.id).await
}

/// Soft removal: the grant rows stay but stop being effective.
pub async fn deactivate_permissions(
    db: &DatabaseConnection,
    req: RemovePermissionsRequest,
) -> Result<RolePermissionsResponse, ApiError> {
    validate_request(&req)?;

    let role = find_role(db, req.role_id).await?;
    let permission_ids = dedup(req.permission_ids);

    let matched = match_grants(db, role.id, &permission_ids, true).await?;
    let ids: Vec<Uuid> = matched.iter().map(|link| link.id).collect();

    role_permission::Entity::update_many()
        .col_expr(role_permission::Column::IsActive, Expr::value(false))
        .filter(role_permission::Column::Id.is_in(ids))
        .exec(db)
        .await?;

    role_permissions_view(db, role.id).await
}

/// Replace a role's entire grant set in one transaction. An empty
/// `permission_ids` revokes everything.
pub async fn replace_permissions(
    db: &DatabaseConnection,
    role_id: Uuid,
    permission_ids: Vec<Uuid>,
) -> Result<RolePermissionsResponse, ApiError> {
    let role = find_active_role(db, role_id).await?;
    let permission_ids = dedup(permission_ids);

    ensure_active_permissions(db, &permission_ids).await?;

    let txn = db.begin().await?;

    role_permission::Entity::delete_many()
        .filter(role_permission::Column::RoleId.eq(role.id))
        .exec(&txn)
        .await?;

    if !permission_ids.is_empty() {
        let now = Utc::now().naive_utc();
        let rows: Vec<role_permission::ActiveModel> = permission_ids
            .into_iter()
            .map(|permission_id| role_permission::ActiveModel {
                id: Set(Uuid::new_v4()),
                role_id: Set(role.id),
                permission_id: Set(permission_id),
                is_active: Set(true),
                assigned_at: Set(now),
            })
            .collect();
        role_permission::Entity::insert_many(rows).exec(&txn).await?;
    }

    txn.commit().await?;

    role_permissions_view(db, role.id).await
}

/// The role's effective permissions: grant row active AND permission active.
pub async fn effective_permissions(
    db: &DatabaseConnection,
    role_id: Uuid,
) -> Result<Vec<permission::Model>, ApiError> {
    let links = role_permission::Entity::find()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .filter(role_permission::Column::IsActive.eq(true))
        .find_also_related(permission::Entity)
        .all(db)
        .await?;

    Ok(links
        .into_iter()
        .filter_map(|(_, permission)| permission)
        .filter(|permission| permission.is_active)
        .collect())
}

pub async fn role_permissions_view(
    db: &DatabaseConnection,
    role_id: Uuid,
) -> Result<RolePermissionsResponse, ApiError> {
    let role = find_role(db, role_id).await?;
    let permissions = effective_permissions(db, role_id).await?;

    Ok(RolePermissionsResponse {
        role: role.into(),
        permissions: permissions.into_iter().map(PermissionResponse::from).collect(),
    })
}

/// Effective permissions grouped by resource, sorted by resource name with
/// actions ascending within each group.
pub async fn permissions_by_resource(
    db: &DatabaseConnection,
    role_id: Uuid,
) -> Result<BTreeMap<String, Vec<PermissionResponse>>, ApiError> {
    find_role(db, role_id).await?;

    let mut permissions = effective_permissions(db, role_id).await?;
    permissions.sort_by(|a, b| a.resource.cmp(&b.resource).then(a.action.cmp(&b.action)));

    let mut grouped: BTreeMap<String, Vec<PermissionResponse>> = BTreeMap::new();
    for permission in permissions {
        grouped
            .entry(permission.resource.clone())
            .or_default()
            .push(permission.into());
    }

    Ok(grouped)
}

/// Reverse lookup: the active roles whose grant of this permission is active.
pub async fn roles_by_permission(
    db: &DatabaseConnection,
    permission_id: Uuid,
) -> Result<PermissionRolesResponse, ApiError> {
    let permission = permissions::find_model(db, permission_id).await?;

    let links = role_permission::Entity::find()
        .filter(role_permission::Column::PermissionId.eq(permission_id))
        .filter(role_permission::Column::IsActive.eq(true))
        .find_also_related(role::Entity)
        .all(db)
        .await?;

    let roles: Vec<RoleResponse> = links
        .into_iter()
        .filter_map(|(_, role)| role)
        .filter(|role| role.is_active)
        .map(RoleResponse::from)
        .collect();

    Ok(PermissionRolesResponse {
        permission: permission.into(),
        roles,
    })
}

fn dedup(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

async fn find_role(db: &DatabaseConnection, id: Uuid) -> Result<role::Model, ApiError> {
    role::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role with ID {} not found", id)))
}

/// Grants can only be added to a live role.
async fn find_active_role(db: &DatabaseConnection, id: Uuid) -> Result<role::Model, ApiError> {
    role::Entity::find_by_id(id)
        .filter(role::Column::IsActive.eq(true))
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role with ID {} not found or inactive", id)))
}

/// Every id must name an existing, active permission; otherwise NotFound
/// listing the offenders.
async fn ensure_active_permissions(
    db: &DatabaseConnection,
    permission_ids: &[Uuid],
) -> Result<(), ApiError> {
    if permission_ids.is_empty() {
        return Ok(());
    }

    let found: HashSet<Uuid> = permission::Entity::find()
        .filter(permission::Column::Id.is_in(permission_ids.to_vec()))
        .filter(permission::Column::IsActive.eq(true))
        .all(db)
        .await?
        .into_iter()
        .map(|permission| permission.id)
        .collect();

    let missing: Vec<String> = permission_ids
        .iter()
        .filter(|id| !found.contains(id))
        .map(ToString::to_string)
        .collect();
    if !missing.is_empty() {
        return Err(ApiError::NotFound(format!(
            "The following permissions were not found or are inactive: {}",
            missing.join(", ")
        )));
    }

    Ok(())
}

async fn match_grants(
    db: &DatabaseConnection,
    role_id: Uuid,
    permission_ids: &[Uuid],
    active_only: bool,
) -> Result<Vec<role_permission::Model>, ApiError> {
    let mut query = role_permission::Entity::find()
        .filter(role_permission::Column::RoleId.eq(role_id))
        .filter(role_permission::Column::PermissionId.is_in(permission_ids.to_vec()));
    if active_only {
        query = query.filter(role_permission::Column::IsActive.eq(true));
    }
    let matched = query.all(db).await?;

    if matched.is_empty() {
        return Err(ApiError::NotFound(
            "None of the specified permissions are assigned to the role".to_string(),
        ));
    }
    if matched.len() != permission_ids.len() {
        let matched_ids: HashSet<Uuid> = matched.iter().map(|link| link.permission_id).collect();
        let unmatched: Vec<String> = permission_ids
            .iter()
            .filter(|id| !matched_ids.contains(id))
            .map(ToString::to_string)
            .collect();
        return Err(ApiError::NotFound(format!(
            "The following permissions are not assigned to the role: {}",
            unmatched.join(", ")
        )));
    }

    Ok(matched)
}
