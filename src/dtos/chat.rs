//! Chat DTOs - Data Transfer Objects per chat 1:1

use crate::entities::Chat;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatDTO {
    pub chat_id: Option<String>,
    pub members: Option<Vec<i32>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Chat> for ChatDTO {
    fn from(value: Chat) -> Self {
        Self {
            chat_id: Some(value.chat_id.clone()),
            members: Some(value.members().to_vec()),
            created_at: Some(value.created_at),
        }
    }
}
