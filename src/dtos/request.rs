//! FriendRequest DTOs - Data Transfer Objects per richieste di amicizia

use crate::dtos::UserDTO;
use crate::entities::{FriendRequest, RequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Struct per gestire io col client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FriendRequestDTO {
    pub request_id: Option<i32>,
    pub from_user_id: Option<i32>,
    pub to_user_id: Option<i32>,
    pub status: Option<RequestStatus>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<FriendRequest> for FriendRequestDTO {
    fn from(value: FriendRequest) -> Self {
        Self {
            request_id: Some(value.request_id),
            from_user_id: Some(value.from_user_id),
            to_user_id: Some(value.to_user_id),
            status: Some(value.status),
            created_at: Some(value.created_at),
        }
    }
}

/// DTO per creare una nuova richiesta (senza request_id, status e created_at)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateFriendRequestDTO {
    pub from_user_id: i32,
    pub to_user_id: i32,
}

/// DTO arricchito con il profilo pubblico del mittente, per la lista delle
/// richieste in arrivo e per la notifica push al destinatario.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EnrichedRequestDTO {
    pub request_id: i32,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub sender: Option<UserDTO>,
}
