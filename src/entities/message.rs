//! Message entity - Entità messaggio

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Un messaggio è immutabile una volta creato; created_at è assegnato dal
/// layer di persistenza al momento della scrittura e definisce l'ordinamento.
#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Message {
    pub message_id: i32,
    // chiave della coppia per le chat 1:1, id decimale del gruppo per i gruppi
    pub conversation_id: String,
    pub sender_id: i32,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
