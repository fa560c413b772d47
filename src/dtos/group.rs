//! Group DTOs - Data Transfer Objects per gruppi

use crate::entities::Group;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GroupDTO {
    pub group_id: Option<i32>,
    pub name: Option<String>,
    pub admin_id: Option<i32>,
    pub members: Option<Vec<i32>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Group> for GroupDTO {
    fn from(value: Group) -> Self {
        Self {
            group_id: Some(value.group_id),
            name: Some(value.name),
            admin_id: Some(value.admin_id),
            members: None, // da popolare con la lista membri quando serve
            created_at: Some(value.created_at),
        }
    }
}

/// DTO per creare un nuovo gruppo (senza group_id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateGroupDTO {
    #[validate(length(min = 1, max = 100, message = "Group name must be between 1 and 100 characters"))]
    pub name: String,
    pub admin_id: i32,
}
