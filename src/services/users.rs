use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::auth::hash_password;
use crate::error::{ApiError, validate_request};
use crate::extractors::Page;
use crate::models::user::{self, UserResponse};
use crate::response::Paginated;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,

    #[validate(email(message = "must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,

    pub phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: Option<String>,

    pub phone: Option<String>,
}

/// Optional listing filters, combined with pagination.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct UserFilter {
    /// Substring match against name or email
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

pub async fn create(db: &DatabaseConnection, req: CreateUserRequest) -> Result<user::Model, ApiError> {
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

    let now = Utc::now().naive_utc();
    let model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name),
        email: Set(req.email),
        password: Set(hash_password(&req.password)?),
        phone: Set(req.phone),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    Ok(model.insert(db).await?)
}

pub async fn list(
    db: &DatabaseConnection,
    filter: UserFilter,
    page: Page,
) -> Result<Paginated<UserResponse>, ApiError> {
    let mut query = user::Entity::find();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        query = query.filter(
            Condition::any()
                .add(user::Column::Name.contains(search))
                .add(user::Column::Email.contains(search)),
        );
    }
    if let Some(active) = filter.is_active {
        query = query.filter(user::Column::IsActive.eq(active));
    }

    let paginator = query
        .order_by_desc(user::Column::CreatedAt)
        .order_by_asc(user::Column::Email)
        .paginate(db, page.limit);

    let total = paginator.num_items().await?;
    let users = paginator.fetch_page(page.page - 1).await?;

    Ok(Paginated {
        data: users.into_iter().map(UserResponse::from).collect(),
        total,
        page: page.page,
        limit: page.limit,
    })
}

pub async fn find_one(db: &DatabaseConnection, id: Uuid) -> Result<user::Model, ApiError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User with ID {} not found", id)))
}

pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    req: UpdateUserRequest,
) -> Result<user::Model, ApiError> {
    validate_request(&req)?;

    let user = find_one(db, id).await?;

    if let Some(email) = &req.email {
        if *email != user.email {
            let taken = user::Entity::find()
                .filter(user::Column::Email.eq(email))
                .filter(user::Column::Id.ne(id))
                .one(db)
                .await?;
            if taken.is_some() {
                return Err(ApiError::Conflict(format!(
                    "User with email '{}' already exists",
                    email
                )));
            }
        }
    }

    let mut active: user::ActiveModel = user.into();
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(email) = req.email {
        active.email = Set(email);
    }
    if let Some(password) = req.password {
        active.password = Set(hash_password(&password)?);
    }
    if let Some(phone) = req.phone {
        active.phone = Set(Some(phone));
    }
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(active.update(db).await?)
}

/// Soft delete. The row stays; authorization and login both check the flag.
pub async fn deactivate(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
    let user = find_one(db, id).await?;

    let mut active: user::ActiveModel = user.into();
    active.is_active = Set(false);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(db).await?;

    Ok(())
}
