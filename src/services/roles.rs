use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, validate_request};
use crate::extractors::Page;
use crate::models::role::{self, RoleResponse};
use crate::models::{role_permission, user_role};
use crate::response::Paginated;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct RoleFilter {
    /// Substring match against the role name or description
    pub search: Option<String>,
    /// Restrict to active (or inactive) roles
    pub is_active: Option<bool>,
}

pub async fn create(db: &DatabaseConnection, req: CreateRoleRequest) -> Result<role::Model, ApiError> {
    validate_request(&req)?;

    let existing = role::Entity::find()
        .filter(role::Column::Name.eq(&req.name))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(format!(
            "Role with name '{}' already exists",
            req.name
        )));
    }

    let now = Utc::now().naive_utc();
    let model = role::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name),
        description: Set(req.description),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(db).await?)
}

/// Paginated listing with derived counters.
///
/// `user_count` and `permission_count` count every join row referencing the
/// role, active or not; they are occupancy counters, not effective-set sizes.
pub async fn list(
    db: &DatabaseConnection,
    filter: RoleFilter,
    page: Page,
) -> Result<Paginated<RoleResponse>, ApiError> {
    let mut query = role::Entity::find();

    let searching = match filter.search.as_deref().filter(|s| !s.is_empty()) {
        Some(search) => {
            query = query.filter(
                Condition::any()
                    .add(role::Column::Name.contains(search))
                    .add(role::Column::Description.contains(search)),
            );
            true
        }
        None => false,
    };

    if let Some(is_active) = filter.is_active {
        query = query.filter(role::Column::IsActive.eq(is_active));
    }

    // Name order when searching so matches read alphabetically; newest first
    // otherwise, with name as a deterministic tiebreak.
    query = if searching {
        query.order_by_asc(role::Column::Name)
    } else {
        query
            .order_by_desc(role::Column::CreatedAt)
            .order_by_asc(role::Column::Name)
    };

    let paginator = query.paginate(db, page.limit);
    let total = paginator.num_items().await?;
    let roles = paginator.fetch_page(page.page - 1).await?;

    let data = attach_counts(db, roles).await?;

    Ok(Paginated {
        data,
        total,
        page: page.page,
        limit: page.limit,
    })
}

pub async fn find_one(db: &DatabaseConnection, id: Uuid) -> Result<RoleResponse, ApiError> {
    let role = find_model(db, id).await?;
    let mut responses = attach_counts(db, vec![role]).await?;
    // attach_counts preserves input order and length
    Ok(responses.remove(0))
}

pub async fn find_model(db: &DatabaseConnection, id: Uuid) -> Result<role::Model, ApiError> {
    role::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Role with ID {} not found", id)))
}

pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateRoleRequest,
) -> Result<role::Model, ApiError> {
    validate_request(&req)?;

    let role = find_model(db, id).await?;

    if let Some(name) = &req.name {
        if *name != role.name {
            let taken = role::Entity::find()
                .filter(role::Column::Name.eq(name))
                .filter(role::Column::Id.ne(id))
                .one(db)
                .await?;
            if taken.is_some() {
                return Err(ApiError::Conflict(format!(
                    "Role with name '{}' already exists",
                    name
                )));
            }
        }
    }

    let mut active: role::ActiveModel = role.into();
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(active.update(db).await?)
}

/// Soft delete, guarded by referential integrity: a role still assigned to
/// active users cannot be deactivated.
pub async fn deactivate(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
    let role = find_model(db, id).await?;

    let active_assignments = user_role::Entity::find()
        .filter(user_role::Column::RoleId.eq(id))
        .filter(user_role::Column::IsActive.eq(true))
        .count(db)
        .await?;
    if active_assignments > 0 {
        return Err(ApiError::BadRequest(format!(
            "Cannot deactivate role: it is assigned to {} active user(s)",
            active_assignments
        )));
    }

    let mut active: role::ActiveModel = role.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await?;

    Ok(())
}

pub async fn find_active(db: &DatabaseConnection) -> Result<Vec<RoleResponse>, ApiError> {
    let roles = role::Entity::find()
        .filter(role::Column::IsActive.eq(true))
        .order_by_asc(role::Column::Name)
        .all(db)
        .await?;

    Ok(roles.into_iter().map(RoleResponse::from).collect())
}

/// Compute join-row counters for a batch of roles with two queries filtered
/// to the batch's ids, tallied in memory.
async fn attach_counts(
    db: &DatabaseConnection,
    roles: Vec<role::Model>,
) -> Result<Vec<RoleResponse>, ApiError> {
    if roles.is_empty() {
        return Ok(Vec::new());
    }

    let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();

    let mut user_counts: HashMap<Uuid, u64> = HashMap::new();
    for link in user_role::Entity::find()
        .filter(user_role::Column::RoleId.is_in(role_ids.clone()))
        .all(db)
        .await?
    {
        *user_counts.entry(link.role_id).or_default() += 1;
    }

    let mut permission_counts: HashMap<Uuid, u64> = HashMap::new();
    for link in role_permission::Entity::find()
        .filter(role_permission::Column::RoleId.is_in(role_ids))
        .all(db)
        .await?
    {
        *permission_counts.entry(link.role_id).or_default() += 1;
    }

    Ok(roles
        .into_iter()
        .map(|r| {
            let users = user_counts.get(&r.id).copied().unwrap_or(0);
            let permissions = permission_counts.get(&r.id).copied().unwrap_or(0);
            RoleResponse::from(r).with_counts(users, permissions)
        })
        .collect())
}
