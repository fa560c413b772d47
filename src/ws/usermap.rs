use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

use crate::dtos::EnrichedRequestDTO;

/// Segnali interni dal resto dell'applicazione verso il task di scrittura
/// del WebSocket di un utente.
pub enum InternalSignal {
    Shutdown,
    /// Sottoscrivi il client al canale della conversazione indicata
    Subscribe(String),
    /// Rimuovi la sottoscrizione alla conversazione indicata
    Unsubscribe(String),
    Error(&'static str),
    /// Nuova richiesta di amicizia in arrivo
    FriendRequest(EnrichedRequestDTO),
}

pub struct UserMap {
    users_online: DashMap<i32, UnboundedSender<InternalSignal>>,
}

impl UserMap {
    pub fn new() -> Self {
        UserMap {
            users_online: DashMap::new(),
        }
    }

    #[instrument(skip(self, tx), fields(user_id))]
    pub fn register_online(&self, user_id: i32, tx: UnboundedSender<InternalSignal>) {
        info!("Registering user {} as online", user_id);
        self.users_online.insert(user_id, tx);
        info!("Total online users: {}", self.users_online.len());
    }

    #[instrument(skip(self), fields(user_id))]
    pub fn remove_from_online(&self, user_id: &i32) {
        info!("Removing user from online");
        self.users_online.remove(user_id);
    }

    /// Invia un segnale all'utente se è online; se è offline il segnale
    /// viene semplicemente perso (la consegna è best effort).
    #[instrument(skip(self, message), fields(user_id))]
    pub fn send_server_message_if_online(&self, user_id: &i32, message: InternalSignal) {
        let message_type = match &message {
            InternalSignal::Shutdown => "Shutdown",
            InternalSignal::Subscribe(room) => {
                info!("Sending Subscribe signal for room {}", room);
                "Subscribe"
            }
            InternalSignal::Unsubscribe(room) => {
                info!("Sending Unsubscribe signal for room {}", room);
                "Unsubscribe"
            }
            InternalSignal::Error(_) => "Error",
            InternalSignal::FriendRequest(req) => {
                info!("Sending FriendRequest signal for request {}", req.request_id);
                "FriendRequest"
            }
        };

        if let Some(entry) = self.users_online.get(user_id) {
            let tx = entry.value();
            if tx.send(message).is_err() {
                warn!("Failed to send {} message to user", message_type);
            } else {
                info!("{} message sent to online user", message_type);
            }
        } else {
            info!("User {} not online, {} message not sent", user_id, message_type);
        }
    }

    /// Get the count of online users
    pub fn online_count(&self) -> usize {
        self.users_online.len()
    }

    /// Check if a specific user is online
    pub fn is_user_online(&self, user_id: &i32) -> bool {
        self.users_online.contains_key(user_id)
    }
}

impl Default for UserMap {
    fn default() -> Self {
        Self::new()
    }
}
