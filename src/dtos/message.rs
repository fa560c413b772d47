//! Message DTOs - Data Transfer Objects per messaggi

use crate::entities::Message;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Struct per gestire io col client: è anche il formato dei messaggi sul
/// WebSocket, in entrambe le direzioni.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageDTO {
    pub message_id: Option<i32>,
    pub conversation_id: Option<String>,
    pub sender_id: Option<i32>,
    pub content: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Message> for MessageDTO {
    fn from(value: Message) -> Self {
        Self {
            message_id: Some(value.message_id),
            conversation_id: Some(value.conversation_id),
            sender_id: Some(value.sender_id),
            content: Some(value.content),
            created_at: Some(value.created_at),
        }
    }
}

/// DTO per creare un nuovo messaggio. created_at non compare: lo assegna il
/// layer di persistenza al momento della scrittura.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateMessageDTO {
    pub conversation_id: String,
    pub sender_id: i32,

    #[validate(length(min = 1, max = 5000, message = "Message content must be between 1 and 5000 characters"))]
    pub content: String,
}

impl TryFrom<MessageDTO> for CreateMessageDTO {
    type Error = &'static str;

    fn try_from(value: MessageDTO) -> Result<Self, Self::Error> {
        Ok(Self {
            conversation_id: value.conversation_id.ok_or("conversation_id is required")?,
            sender_id: value.sender_id.ok_or("sender_id is required")?,
            content: value.content.ok_or("content is required")?,
        })
    }
}
