//! FriendRequest entity - Richiesta di amicizia con ciclo di vita a stati

use super::enums::RequestStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct FriendRequest {
    pub request_id: i32,
    pub from_user_id: i32,
    pub to_user_id: i32,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}
