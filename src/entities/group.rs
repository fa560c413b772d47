//! Group entity - Gruppo con un singolo admin

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct Group {
    pub group_id: i32,
    pub name: String,
    // unico proprietario del gruppo; è sempre anche membro
    pub admin_id: i32,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Chiave della conversazione del gruppo nella tabella messaggi e nei
    /// canali di broadcast: l'id decimale puro, che non può collidere con le
    /// chiavi delle chat 1:1 (quelle contengono sempre il separatore).
    pub fn conversation_id(&self) -> String {
        self.group_id.to_string()
    }

    pub fn is_admin(&self, user_id: i32) -> bool {
        self.admin_id == user_id
    }
}
