//! ChatRepository - Repository per la gestione delle chat 1:1

use super::Read;
use crate::entities::Chat;
use chrono::Utc;
use sqlx::{Error, MySqlPool};
use tracing::{debug, info, instrument};

// CHAT REPOSITORY
pub struct ChatRepository {
    connection_pool: MySqlPool,
}

impl ChatRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Upsert della chat tra due utenti: deriva l'identificatore canonico e
    /// inserisce la riga solo se assente, quindi una chiamata ripetuta non
    /// sovrascrive nulla (il created_at originale sopravvive sempre).
    /// Restituisce la riga memorizzata, preesistente o appena creata.
    #[instrument(skip(self), fields(user_a = %user_a, user_b = %user_b))]
    pub async fn ensure_between(&self, user_a: &i32, user_b: &i32) -> Result<Chat, Error> {
        let chat_id = Chat::derive_id(*user_a, *user_b);

        // stessa regola di ordinamento di derive_id
        let (member_low, member_high) = if user_a.to_string() <= user_b.to_string() {
            (user_a, user_b)
        } else {
            (user_b, user_a)
        };

        debug!("Ensuring chat {}", chat_id);

        sqlx::query(
            "INSERT IGNORE INTO chats (chat_id, member_low, member_high, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&chat_id)
        .bind(member_low)
        .bind(member_high)
        .bind(Utc::now())
        .execute(&self.connection_pool)
        .await?;

        let chat = self
            .read(&chat_id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound)?;

        info!("Chat {} ensured", chat.chat_id);
        Ok(chat)
    }

    /// Tutte le chat di cui l'utente è membro.
    pub async fn find_many_by_user(&self, user_id: &i32) -> Result<Vec<Chat>, Error> {
        let chats = sqlx::query_as::<_, Chat>(
            "SELECT chat_id, member_low, member_high, created_at \
             FROM chats \
             WHERE member_low = ? OR member_high = ? \
             ORDER BY created_at",
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(chats)
    }
}

impl Read<Chat, String> for ChatRepository {
    #[instrument(skip(self), fields(chat_id = %id))]
    async fn read(&self, id: &String) -> Result<Option<Chat>, Error> {
        debug!("Reading chat by id");
        let chat = sqlx::query_as::<_, Chat>(
            "SELECT chat_id, member_low, member_high, created_at FROM chats WHERE chat_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(chat)
    }
}
