use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, validate_request};
use crate::extractors::Page;
use crate::models::permission::{self, PermissionResponse};
use crate::models::role_permission;
use crate::response::Paginated;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePermissionRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 50, message = "resource must be 1-50 characters"))]
    pub resource: String,

    #[validate(length(min = 1, max = 50, message = "action must be 1-50 characters"))]
    pub action: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePermissionRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "description must be at most 255 characters"))]
    pub description: Option<String>,

    #[validate(length(min = 1, max = 50, message = "resource must be 1-50 characters"))]
    pub resource: Option<String>,

    #[validate(length(min = 1, max = 50, message = "action must be 1-50 characters"))]
    pub action: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct PermissionFilter {
    /// Substring match against name, description or resource
    pub search: Option<String>,
    /// Exact resource filter
    pub resource: Option<String>,
    /// Exact action filter
    pub action: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn create(
    db: &DatabaseConnection,
    req: CreatePermissionRequest,
) -> Result<permission::Model, ApiError> {
    validate_request(&req)?;

    let by_name = permission::Entity::find()
        .filter(permission::Column::Name.eq(&req.name))
        .one(db)
        .await?;
    if by_name.is_some() {
        return Err(ApiError::Conflict(format!(
            "Permission with name '{}' already exists",
            req.name
        )));
    }

    let by_pair = permission::Entity::find()
        .filter(permission::Column::Resource.eq(&req.resource))
        .filter(permission::Column::Action.eq(&req.action))
        .one(db)
        .await?;
    if by_pair.is_some() {
        return Err(ApiError::Conflict(format!(
            "Permission for resource '{}' and action '{}' already exists",
            req.resource, req.action
        )));
    }

    let now = Utc::now().naive_utc();
    let model = permission::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name),
        description: Set(req.description),
        resource: Set(req.resource),
        action: Set(req.action),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(db).await?)
}

/// Paginated listing ordered by (resource, action).
///
/// `role_count` counts every role_permission row referencing the permission,
/// active or not.
pub async fn list(
    db: &DatabaseConnection,
    filter: PermissionFilter,
    page: Page,
) -> Result<Paginated<PermissionResponse>, ApiError> {
    let mut query = permission::Entity::find();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(permission::Column::Name.contains(search))
                .add(permission::Column::Description.contains(search))
                .add(permission::Column::Resource.contains(search)),
        );
    }
    if let Some(resource) = filter.resource.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(permission::Column::Resource.eq(resource));
    }
    if let Some(action) = filter.action.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(permission::Column::Action.eq(action));
    }
    if let Some(active) = filter.is_active {
        query = query.filter(permission::Column::IsActive.eq(active));
    }

    let paginator = query
        .order_by_asc(permission::Column::Resource)
        .order_by_asc(permission::Column::Action)
        .paginate(db, page.limit);

    let total = paginator.num_items().await?;
    let permissions = paginator.fetch_page(page.page - 1).await?;

    let data = attach_counts(db, permissions).await?;

    Ok(Paginated {
        data,
        total,
        page: page.page,
        limit: page.limit,
    })
}

pub async fn find_one(db: &DatabaseConnection, id: Uuid) -> Result<PermissionResponse, ApiError> {
    let permission = find_model(db, id).await?;
    let mut responses = attach_counts(db, vec![permission]).await?;
    Ok(responses.remove(0))
}

pub async fn find_model(db: &DatabaseConnection, id: Uuid) -> Result<permission::Model, ApiError> {
    permission::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Permission with ID {} not found", id)))
}

pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdatePermissionRequest,
) -> Result<permission::Model, ApiError> {
    validate_request(&req)?;

    let permission = find_model(db, id).await?;

    if let Some(name) = &req.name {
        if *name != permission.name {
            let taken = permission::Entity::find()
                .filter(permission::Column::Name.eq(name))
                .filter(permission::Column::Id.ne(id))
                .one(db)
                .await?;
            if taken.is_some() {
                return Err(ApiError::Conflict(format!(
                    "Permission with name '{}' already exists",
                    name
                )));
            }
        }
    }

    // The (resource, action) pair stays unique across the other rows even
    // when only one half of it changes.
    let new_resource = req.resource.as_deref().unwrap_or(&permission.resource);
    let new_action = req.action.as_deref().unwrap_or(&permission.action);
    if new_resource != permission.resource || new_action != permission.action {
        let taken = permission::Entity::find()
            .filter(permission::Column::Resource.eq(new_resource))
            .filter(permission::Column::Action.eq(new_action))
            .filter(permission::Column::Id.ne(id))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(ApiError::Conflict(format!(
                "Permission for resource '{}' and action '{}' already exists",
                new_resource, new_action
            )));
        }
    }

    let mut active: permission::ActiveModel = permission.into();
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(description) = req.description {
        active.description = Set(Some(description));
    }
    if let Some(resource) = req.resource {
        active.resource = Set(resource);
    }
    if let Some(action) = req.action {
        active.action = Set(action);
    }
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(active.update(db).await?)
}

/// Soft delete, guarded: a permission still granted to active roles cannot
/// be deactivated.
pub async fn deactivate(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
    let permission = find_model(db, id).await?;

    let active_grants = role_permission::Entity::find()
        .filter(role_permission::Column::PermissionId.eq(id))
        .filter(role_permission::Column::IsActive.eq(true))
        .count(db)
        .await?;
    if active_grants > 0 {
        return Err(ApiError::BadRequest(format!(
            "Cannot deactivate permission: it is assigned to {} active role(s)",
            active_grants
        )));
    }

    let mut active: permission::ActiveModel = permission.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await?;

    Ok(())
}

pub async fn find_active(db: &DatabaseConnection) -> Result<Vec<PermissionResponse>, ApiError> {
    let permissions = permission::Entity::find()
        .filter(permission::Column::IsActive.eq(true))
        .order_by_asc(permission::Column::Resource)
        .order_by_asc(permission::Column::Action)
        .all(db)
        .await?;

    Ok(permissions.into_iter().map(PermissionResponse::from).collect())
}

/// Distinct resource names across all permissions, sorted.
pub async fn unique_resources(db: &DatabaseConnection) -> Result<Vec<String>, ApiError> {
    Ok(permission::Entity::find()
        .select_only()
        .column(permission::Column::Resource)
        .distinct()
        .order_by_asc(permission::Column::Resource)
        .into_tuple::<String>()
        .all(db)
        .await?)
}

/// Distinct action names across all permissions, sorted.
pub async fn unique_actions(db: &DatabaseConnection) -> Result<Vec<String>, ApiError> {
    Ok(permission::Entity::find()
        .select_only()
        .column(permission::Column::Action)
        .distinct()
        .order_by_asc(permission::Column::Action)
        .into_tuple::<String>()
        .all(db)
        .await?)
}

async fn attach_counts(
    db: &DatabaseConnection,
    permissions: Vec<permission::Model>,
) -> Result<Vec<PermissionResponse>, ApiError> {
    if permissions.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();

    let mut role_counts: HashMap<Uuid, u64> = HashMap::new();
    for link in role_permission::Entity::find()
        .filter(role_permission::Column::PermissionId.is_in(ids))
        .all(db)
        .await?
    {
        *role_counts.entry(link.permission_id).or_default() += 1;
    }

    Ok(permissions
        .into_iter()
        .map(|p| {
            let count = role_counts.get(&p.id).copied().unwrap_or(0);
            PermissionResponse::from(p).with_role_count(count)
        })
        .collect())
}
