//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, configurazioni e stato condiviso
//! necessario per gestire l'applicazione.

use crate::repositories::{
    ChatRepository, FriendRequestRepository, GroupRepository, MessageRepository, UserRepository,
};
use crate::ws::roommap::RoomMap;
use crate::ws::usermap::UserMap;
use sqlx::MySqlPool;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    /// Repository per la gestione delle chat 1:1
    pub chat: ChatRepository,

    /// Repository per la gestione dei messaggi
    pub msg: MessageRepository,

    /// Repository per la gestione dei gruppi
    pub group: GroupRepository,

    /// Repository per la gestione delle richieste di amicizia
    pub request: FriendRequestRepository,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// Mappa concorrente degli utenti online con i loro canali WebSocket
    pub users_online: UserMap,

    /// Canali di broadcast delle conversazioni con almeno un utente online
    pub rooms_online: RoomMap,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito e la JWT secret.
    pub fn new(pool: MySqlPool, jwt_secret: String) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            chat: ChatRepository::new(pool.clone()),
            msg: MessageRepository::new(pool.clone()),
            group: GroupRepository::new(pool.clone()),
            request: FriendRequestRepository::new(pool),
            jwt_secret,
            users_online: UserMap::new(),
            rooms_online: RoomMap::new(),
        }
    }
}
