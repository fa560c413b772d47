//! UserRepository - Repository per la gestione degli utenti

use super::{Create, Read, Update};
use crate::dtos::{CreateUserDTO, UpdateProfileDTO};
use crate::entities::User;
use chrono::Utc;
use sqlx::{Error, MySqlPool};

const USER_COLUMNS: &str =
    "user_id, email, password, name, about, phone, image_url, created_at";

// USER REPO
pub struct UserRepository {
    connection_pool: MySqlPool,
}

impl UserRepository {
    pub fn new(connection_pool: MySqlPool) -> UserRepository {
        Self { connection_pool }
    }

    /// Considero l'email univoca: è la credenziale di login.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }

    /// Elenco completo degli utenti, in ordine di registrazione.
    pub async fn find_all(&self) -> Result<Vec<User>, Error> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY user_id"
        ))
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }

    /// Ricerca per prefisso su nome o email (per la funzionalità di search).
    pub async fn search_by_name_partial(&self, pattern: &str) -> Result<Vec<User>, Error> {
        let prefix = format!("{}%", pattern);
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE name LIKE ? OR email LIKE ? LIMIT 10"
        ))
        .bind(&prefix)
        .bind(&prefix)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(users)
    }

    /// Insieme degli amici dell'utente.
    pub async fn friend_ids_of(&self, user_id: &i32) -> Result<Vec<i32>, Error> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT friend_id FROM user_friends WHERE user_id = ? ORDER BY friend_id",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(ids)
    }

    /// Insieme dei destinatari delle richieste di amicizia in uscita.
    pub async fn sent_request_targets(&self, user_id: &i32) -> Result<Vec<i32>, Error> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT target_id FROM user_sent_requests WHERE user_id = ? ORDER BY target_id",
        )
        .bind(user_id)
        .fetch_all(&self.connection_pool)
        .await?;

        Ok(ids)
    }

    /// Rimozione esplicita dell'immagine profilo.
    pub async fn clear_image(&self, user_id: &i32) -> Result<(), Error> {
        sqlx::query("UPDATE users SET image_url = NULL WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.connection_pool)
            .await?;

        Ok(())
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, Error> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO users (email, password, created_at) VALUES (?, ?, ?)",
        )
        .bind(&data.email)
        .bind(&data.password)
        .bind(now)
        .execute(&self.connection_pool)
        .await?;

        // Get the last inserted ID
        let new_id = result.last_insert_id() as i32;

        Ok(User {
            user_id: new_id,
            email: data.email.clone(),
            password: data.password.clone(),
            name: None,
            about: None,
            phone: None,
            image_url: None,
            created_at: now,
        })
    }
}

impl Read<User, i32> for UserRepository {
    async fn read(&self, id: &i32) -> Result<Option<User>, Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE user_id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await?;

        Ok(user)
    }
}

impl Update<User, UpdateProfileDTO, i32> for UserRepository {
    /// Aggiornamento parziale del profilo: vengono toccati solo i campi
    /// presenti nel DTO, gli altri restano come sono (semantica di merge).
    async fn update(&self, id: &i32, data: &UpdateProfileDTO) -> Result<User, Error> {
        let current_user = self
            .read(id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound)?;

        if data.name.is_none()
            && data.about.is_none()
            && data.phone.is_none()
            && data.image_url.is_none()
        {
            return Ok(current_user);
        }

        // Build dynamic UPDATE query using QueryBuilder (idiomatic SQLx way)
        let mut query_builder = sqlx::QueryBuilder::<sqlx::MySql>::new("UPDATE users SET ");

        let mut separated = query_builder.separated(", ");
        if let Some(ref name) = data.name {
            separated.push("name = ");
            separated.push_bind_unseparated(name);
        }
        if let Some(ref about) = data.about {
            separated.push("about = ");
            separated.push_bind_unseparated(about);
        }
        if let Some(ref phone) = data.phone {
            separated.push("phone = ");
            separated.push_bind_unseparated(phone);
        }
        if let Some(ref image_url) = data.image_url {
            separated.push("image_url = ");
            separated.push_bind_unseparated(image_url);
        }

        query_builder.push(" WHERE user_id = ");
        query_builder.push_bind(id);

        query_builder.build().execute(&self.connection_pool).await?;

        self.read(id).await?.ok_or_else(|| sqlx::Error::RowNotFound)
    }
}
