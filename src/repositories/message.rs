//! MessageRepository - Repository per la gestione dei messaggi

use super::Create;
use crate::dtos::CreateMessageDTO;
use crate::entities::Message;
use chrono::{DateTime, Utc};
use sqlx::{Error, MySqlPool};

// MESSAGE REPO
pub struct MessageRepository {
    connection_pool: MySqlPool,
}

impl MessageRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Messaggi di una conversazione in ordine di creazione crescente.
    ///
    /// Supporta la paginazione all'indietro: con `before_date` restituisce
    /// solo i messaggi precedenti a quella data. `limit` è il numero massimo
    /// di messaggi restituiti (i più recenti della finestra selezionata).
    pub async fn find_many_by_conversation(
        &self,
        conversation_id: &str,
        before_date: Option<&DateTime<Utc>>,
        limit: i64,
    ) -> Result<Vec<Message>, Error> {
        // la sottoquery seleziona la coda più recente della finestra,
        // l'ordinamento esterno la riporta in ordine cronologico
        let messages = if let Some(before) = before_date {
            sqlx::query_as::<_, Message>(
                "SELECT message_id, conversation_id, sender_id, content, created_at FROM ( \
                    SELECT message_id, conversation_id, sender_id, content, created_at \
                    FROM messages \
                    WHERE conversation_id = ? AND created_at < ? \
                    ORDER BY created_at DESC \
                    LIMIT ? \
                 ) AS window ORDER BY created_at ASC",
            )
            .bind(conversation_id)
            .bind(before)
            .bind(limit)
            .fetch_all(&self.connection_pool)
            .await?
        } else {
            sqlx::query_as::<_, Message>(
                "SELECT message_id, conversation_id, sender_id, content, created_at FROM ( \
                    SELECT message_id, conversation_id, sender_id, content, created_at \
                    FROM messages \
                    WHERE conversation_id = ? \
                    ORDER BY created_at DESC \
                    LIMIT ? \
                 ) AS window ORDER BY created_at ASC",
            )
            .bind(conversation_id)
            .bind(limit)
            .fetch_all(&self.connection_pool)
            .await?
        };

        Ok(messages)
    }
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    /// Il timestamp di creazione viene assegnato qui, al momento della
    /// scrittura: è il layer di persistenza a stabilire l'ordinamento.
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, Error> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, sender_id, content, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(&data.conversation_id)
        .bind(data.sender_id)
        .bind(&data.content)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        // Get the last inserted ID
        let new_id = result.last_insert_id() as i32;

        Ok(Message {
            message_id: new_id,
            conversation_id: data.conversation_id.clone(),
            sender_id: data.sender_id,
            content: data.content.clone(),
            created_at: now,
        })
    }
}
