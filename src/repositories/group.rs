//! GroupRepository - Repository per la gestione dei gruppi e dei loro membri

use super::{Create, Delete, Read};
use crate::dtos::CreateGroupDTO;
use crate::entities::Group;
use chrono::Utc;
use sqlx::{Error, MySqlPool};
use tracing::{debug, info, instrument};

// GROUP REPOSITORY
pub struct GroupRepository {
    connection_pool: MySqlPool,
}

impl GroupRepository {
    pub fn new(connection_pool: MySqlPool) -> Self {
        Self { connection_pool }
    }

    /// Tutti i gruppi esistenti.
    pub async fn find_all(&self) -> Result<Vec<Group>, Error> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT group_id, name, admin_id, created_at FROM chat_groups ORDER BY group_id",
        )
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(groups)
    }

    /// Gruppi di cui l'utente è membro.
    pub async fn find_many_by_member(&self, user_id: &i32) -> Result<Vec<Group>, Error> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT g.group_id, g.name, g.admin_id, g.created_at \
             FROM chat_groups g \
             INNER JOIN group_members gm ON g.group_id = gm.group_id \
             WHERE gm.user_id = ? \
             ORDER BY g.group_id",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(groups)
    }

    /// Id dei membri del gruppo, in ordine di ingresso.
    pub async fn member_ids_of(&self, group_id: &i32) -> Result<Vec<i32>, Error> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT user_id FROM group_members WHERE group_id = ? ORDER BY member_since, user_id",
        )
        .bind(group_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(ids)
    }

    pub async fn is_member(&self, group_id: &i32, user_id: &i32) -> Result<bool, Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM group_members WHERE group_id = ? AND user_id = ?",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await?;

        Ok(count > 0)
    }

    /// Unione insiemistica: aggiungere un membro già presente è un no-op.
    #[instrument(skip(self), fields(group_id = %group_id, user_id = %user_id))]
    pub async fn add_member(&self, group_id: &i32, user_id: &i32) -> Result<(), Error> {
        debug!("Adding member to group");
        sqlx::query(
            "INSERT IGNORE INTO group_members (group_id, user_id, member_since) VALUES (?, ?, ?)",
        )
        .bind(group_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.connection_pool)
        .await?;

        Ok(())
    }

    /// Rimozione insiemistica: rimuovere un membro assente è un no-op.
    #[instrument(skip(self), fields(group_id = %group_id, user_id = %user_id))]
    pub async fn remove_member(&self, group_id: &i32, user_id: &i32) -> Result<(), Error> {
        debug!("Removing member from group");
        sqlx::query("DELETE FROM group_members WHERE group_id = ? AND user_id = ?")
            .bind(group_id)
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}

impl Create<Group, CreateGroupDTO> for GroupRepository {
    /// Il creatore diventa admin e primo membro nella stessa transazione:
    /// un gruppo senza il proprio admin tra i membri non è mai osservabile.
    #[instrument(skip(self, data), fields(admin_id = %data.admin_id))]
    async fn create(&self, data: &CreateGroupDTO) -> Result<Group, Error> {
        debug!("Creating new group");
        let now = Utc::now();

        let mut tx = self.connection_pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO chat_groups (name, admin_id, created_at) VALUES (?, ?, ?)",
        )
        .bind(&data.name)
        .bind(data.admin_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let new_id = result.last_insert_id() as i32;

        sqlx::query(
            "INSERT INTO group_members (group_id, user_id, member_since) VALUES (?, ?, ?)",
        )
        .bind(new_id)
        .bind(data.admin_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!("Group created with id {}", new_id);

        Ok(Group {
            group_id: new_id,
            name: data.name.clone(),
            admin_id: data.admin_id,
            created_at: now,
        })
    }
}

impl Read<Group, i32> for GroupRepository {
    async fn read(&self, id: &i32) -> Result<Option<Group>, Error> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT group_id, name, admin_id, created_at FROM chat_groups WHERE group_id = ?",
        )
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(group)
    }
}

impl Delete<i32> for GroupRepository {
    /// Elimina il gruppo e, via CASCADE, le righe di membership. I messaggi
    /// della conversazione non vengono toccati.
    #[instrument(skip(self), fields(group_id = %id))]
    async fn delete(&self, id: &i32) -> Result<(), Error> {
        debug!("Deleting group");
        sqlx::query("DELETE FROM chat_groups WHERE group_id = ?")
            .bind(id)
            .execute(&self.connection_pool)
            .await?;

        info!("Group deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: alla creazione l'admin è anche membro
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users")))]
    async fn test_create_puts_admin_among_members(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = GroupRepository::new(pool);

        let group = repo
            .create(&CreateGroupDTO {
                name: "Book club".to_string(),
                admin_id: 2,
            })
            .await?;

        assert_eq!(group.admin_id, 2);
        assert_eq!(repo.member_ids_of(&group.group_id).await?, vec![2]);
        assert!(repo.is_member(&group.group_id, &2).await?);

        Ok(())
    }

    /// Test: add_member è idempotente
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "groups")))]
    async fn test_add_member_is_idempotent(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = GroupRepository::new(pool);

        repo.add_member(&1, &3).await?;
        let after_first = repo.member_ids_of(&1).await?;

        repo.add_member(&1, &3).await?;
        let after_second = repo.member_ids_of(&1).await?;

        assert_eq!(after_first, after_second);
        assert!(repo.is_member(&1, &3).await?);

        Ok(())
    }

    /// Test: remove_member è idempotente
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "groups")))]
    async fn test_remove_member_is_idempotent(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = GroupRepository::new(pool);

        repo.remove_member(&1, &2).await?;
        let after_first = repo.member_ids_of(&1).await?;

        repo.remove_member(&1, &2).await?;
        let after_second = repo.member_ids_of(&1).await?;

        assert_eq!(after_first, after_second);
        assert!(!repo.is_member(&1, &2).await?);

        Ok(())
    }

    /// Test: l'eliminazione del gruppo porta via le membership ma lascia i
    /// messaggi della conversazione nella tabella
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "groups")))]
    async fn test_delete_cascades_members_but_orphans_messages(
        pool: MySqlPool,
    ) -> sqlx::Result<()> {
        let repo = GroupRepository::new(pool.clone());

        repo.delete(&1).await?;

        assert!(repo.read(&1).await?.is_none());
        assert!(repo.member_ids_of(&1).await?.is_empty());

        // il messaggio del gruppo (conversation_id = '1') è rimasto
        let orphaned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = '1'")
                .fetch_one(&pool)
                .await?;
        assert_eq!(orphaned, 1);

        Ok(())
    }

    /// Test: elenco gruppi per membro
    #[sqlx::test(fixtures(path = "../../fixtures", scripts("users", "groups")))]
    async fn test_find_many_by_member(pool: MySqlPool) -> sqlx::Result<()> {
        let repo = GroupRepository::new(pool);

        let bob_groups = repo.find_many_by_member(&2).await?;
        assert_eq!(bob_groups.len(), 1);
        assert_eq!(bob_groups[0].name, "Study");

        let dave_groups = repo.find_many_by_member(&4).await?;
        assert!(dave_groups.is_empty());

        Ok(())
    }
}
