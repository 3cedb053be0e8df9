use chrono::NaiveDateTime;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Permission entity — an atomic capability identified by a unique name
/// and a unique (resource, action) pair.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "permissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(unique)]
    pub name: String,

    pub description: Option<String>,

    /// Resource the permission applies to (e.g. "users")
    pub resource: String,

    /// Action on the resource (e.g. "create")
    pub action: String,

    pub is_active: bool,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_permission::Entity")]
    RolePermissions,
}

impl Related<super::role_permission::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePermissions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Permission data for API responses, optionally carrying the count of
/// all role_permission rows referencing it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PermissionResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub resource: String,
    pub action: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role_count: Option<u64>,
}

impl PermissionResponse {
    pub fn with_role_count(mut self, role_count: u64) -> Self {
        self.role_count = Some(role_count);
        self
    }
}

impl From<Model> for PermissionResponse {
    fn from(permission: Model) -> Self {
        PermissionResponse {
            id: permission.id,
            name: permission.name,
            description: permission.description,
            resource: permission.resource,
            action: permission.action,
            is_active: permission.is_active,
            created_at: permission.created_at,
            updated_at: permission.updated_at,
            role_count: None,
        }
    }
}
