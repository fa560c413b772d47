//! WebSocket Module - Gestione WebSocket per comunicazione real-time
//!
//! Questo modulo gestisce le connessioni WebSocket per la consegna live dei
//! messaggi e delle notifiche. Include:
//! - Gestione upgrade HTTP -> WebSocket
//! - Gestione connessioni (split sender/receiver)
//! - Handler per i messaggi in arrivo dal client
//! - Mappe concorrenti di utenti online e conversazioni attive

pub mod connection;
pub mod event_handlers;
pub mod roommap;
pub mod usermap;

// Re-exports pubblici
pub use connection::handle_socket;

use crate::{AppState, entities::User};
use axum::{
    Extension,
    extract::{State, ws::WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;

/// Capacità dei canali broadcast per conversazione
pub const BROADCAST_CHANNEL_CAPACITY: usize = 128;
/// Dimensione massima di un batch di messaggi in uscita
pub const BATCH_MAX_SIZE: usize = 10;
/// Intervallo di svuotamento del batch in millisecondi
pub const BATCH_INTERVAL: u64 = 100;
/// Intervallo minimo tra due messaggi in ingresso dallo stesso client
pub const RATE_LIMITER_MILLIS: u64 = 50;
/// Timeout di inattività della connessione in secondi
pub const TIMEOUT_DURATION_SECONDS: u64 = 600;

/// Entry point per gestire richieste di upgrade WebSocket
/// Operazioni:
/// 1. Estrarre l'utente dall'autenticazione JWT
/// 2. Eseguire upgrade HTTP -> WebSocket
/// 3. Passare la connessione ad handle_socket
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione JWT
) -> Response {
    let user_id = current_user.user_id;

    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}
