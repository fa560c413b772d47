//! FriendRequestRepository - Repository per la gestione delle richieste di amicizia

use super::{Create, Read};
use crate::dtos::CreateFriendRequestDTO;
use crate::entities::{FriendRequest, RequestStatus};
use chrono::Utc;
use sqlx::{Error, MySqlPool};
use tracing::{debug, info, instrument};

// FRIEND REQUEST REPOSITORY
pub struct FriendRequestRepository {
    connection_pool: MySqlPool,
}

impl FriendRequestRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Richieste pendenti ricevute da un utente.
    pub async fn find_pending_for_user(
        &self,
        user_id: &i32,
    ) -> Result<Vec<FriendRequest>, Error> {
        let requests = sqlx::query_as::<_, FriendRequest>(
            "SELECT request_id, from_user_id, to_user_id, status, created_at \
             FROM friend_requests \
             WHERE to_user_id = ? AND status = 'PENDING' \
             ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(requests)
    }

    /// Esiste una richiesta pendente da `from` verso `to`?
    /// Il controllo è direzionale: il chiamante lo applica in entrambi i
    /// versi per distinguere "già inviata" da "già ricevuta".
    pub async fn has_pending(&self, from: &i32, to: &i32) -> Result<bool, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM friend_requests \
             WHERE from_user_id = ? AND to_user_id = ? AND status = 'PENDING'",
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(count > 0)
    }

    /// Transizione di stato (accept/decline). Gli stati di arrivo sono
    /// terminali: la verifica che la richiesta sia ancora pendente spetta al
    /// service prima di chiamare questo metodo.
    pub async fn update_status(
        &self,
        request_id: &i32,
        new_status: &RequestStatus,
    ) -> Result<(), Error> {
        sqlx::query("UPDATE friend_requests SET status = ? WHERE request_id = ?")
            .bind(new_status.clone())
            .bind(request_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}

impl Create<FriendRequest, CreateFriendRequestDTO> for FriendRequestRepository {
    /// Crea la richiesta e registra il destinatario nell'insieme delle
    /// richieste in uscita del mittente, nella stessa transazione: o si
    /// scrivono entrambi i fatti o nessuno dei due.
    #[instrument(skip(self, data), fields(from = %data.from_user_id, to = %data.to_user_id))]
    async fn create(&self, data: &CreateFriendRequestDTO) -> Result<FriendRequest, Error> {
        debug!("Creating friend request");
        let now = Utc::now();
        let status = RequestStatus::Pending;

        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO friend_requests (from_user_id, to_user_id, status, created_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(data.from_user_id)
        .bind(data.to_user_id)
        .bind(status.clone())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let new_id = result.last_insert_id() as i32;

        sqlx::query("INSERT IGNORE INTO user_sent_requests (user_id, target_id) VALUES (?, ?)")
            .bind(data.from_user_id)
            .bind(data.to_user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Friend request created with id {}", new_id);

        Ok(FriendRequest {
            request_id: new_id,
            from_user_id: data.from_user_id,
            to_user_id: data.to_user_id,
            status,
            created_at: now,
        })
    }
}

impl Read<FriendRequest, i32> for FriendRequestRepository {
    async fn read(&self, id: &i32) -> Result<Option<FriendRequest>, Error> {
        let request = sqlx::query_as::<_, FriendRequest>(
            "SELECT request_id, from_user_id, to_user_id, status, created_at \
             FROM friend_requests \
             WHERE request_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: la creazione scrive richiesta e marcatore in uscita insieme
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn test_create_writes_request_and_sent_marker(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = FriendRequestRepository::new(pool.clone());

        let created = repo
            .create(&CreateFriendRequestDTO {
                from_user_id: 1,
                to_user_id: 3,
            })
            .await?;

        assert_eq!(created.status, RequestStatus::Pending);

        let stored = repo.read(&created.request_id).await?.unwrap();
        assert_eq!(stored.from_user_id, 1);
        assert_eq!(stored.to_user_id, 3);
        assert_eq!(stored.status, RequestStatus::Pending);

        let marker: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_sent_requests WHERE user_id = 1 AND target_id = 3",
        )
        .fetch_one(&pool)
        .await?;
        assert_eq!(marker, 1);

        Ok(())
    }

    /// Test: has_pending è direzionale
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friend_requests")))]
    async fn test_has_pending_is_directional(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = FriendRequestRepository::new(pool);

        // nei fixtures: pendente da 3 verso 1, rifiutata da 4 verso 2
        assert!(repo.has_pending(&3, &1).await?);
        assert!(!repo.has_pending(&1, &3).await?);
        assert!(!repo.has_pending(&4, &2).await?); // non più pendente

        Ok(())
    }

    /// Test: la transizione di stato viene persistita
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friend_requests")))]
    async fn test_update_status(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = FriendRequestRepository::new(pool);

        repo.update_status(&1, &RequestStatus::Accepted).await?;

        let updated = repo.read(&1).await?.unwrap();
        assert_eq!(updated.status, RequestStatus::Accepted);
        assert!(!repo.has_pending(&3, &1).await?);

        Ok(())
    }

    /// Test: elenco richieste pendenti per destinatario
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "friend_requests")))]
    async fn test_find_pending_for_user(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = FriendRequestRepository::new(pool);

        let for_alice = repo.find_pending_for_user(&1).await?;
        assert_eq!(for_alice.len(), 1);
        assert_eq!(for_alice[0].from_user_id, 3);

        // la richiesta verso Bob è già stata rifiutata
        let for_bob = repo.find_pending_for_user(&2).await?;
        assert!(for_bob.is_empty());

        Ok(())
    }
}
