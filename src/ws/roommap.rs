use crate::dtos::MessageDTO;
use crate::ws::BROADCAST_CHANNEL_CAPACITY;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::SendError;
use tokio::sync::broadcast::{Receiver, Sender};
use tracing::{info, instrument, warn};

/// Mappa delle conversazioni attive. La chiave è la chiave di conversazione:
/// l'identificatore canonico della coppia per le chat 1:1, l'id decimale del
/// gruppo per i gruppi.
pub struct RoomMap {
    channels: DashMap<String, Sender<Arc<MessageDTO>>>,
}

impl RoomMap {
    pub fn new() -> Self {
        RoomMap {
            channels: DashMap::new(),
        }
    }

    #[instrument(skip(self), fields(room))]
    pub fn subscribe(&self, room: &str) -> Receiver<Arc<MessageDTO>> {
        match self.channels.get(room) {
            // sottoscrizione a una conversazione senza canale: lo creiamo ora
            None => {
                info!("Creating new broadcast channel for room");
                // Arc<MessageDTO> per condividere il riferimento, non il messaggio
                let (tx, rx) = broadcast::channel::<Arc<MessageDTO>>(BROADCAST_CHANNEL_CAPACITY);
                self.channels.insert(room.to_string(), tx);
                rx
            }
            // sottoscrivere un canale esistente == ottenere un nuovo rx dal tx
            Some(c) => {
                info!("Subscribing to existing broadcast channel");
                c.value().subscribe()
            }
        }
    }

    #[instrument(skip(self, rooms))]
    pub fn subscribe_multiple(&self, rooms: Vec<String>) -> Vec<Receiver<Arc<MessageDTO>>> {
        info!(count = rooms.len(), "Subscribing to multiple rooms");
        rooms.into_iter().map(|room| self.subscribe(&room)).collect()
    }

    #[instrument(skip(self, msg), fields(room))]
    pub fn send(
        &self,
        room: &str,
        msg: Arc<MessageDTO>,
    ) -> Result<usize, SendError<Arc<MessageDTO>>> {
        if let Some(channel) = self.channels.get(room) {
            match channel.send(msg.clone()) {
                Ok(n) => {
                    info!(receivers = n, "Message broadcast to receivers");
                    Ok(n)
                }
                Err(e) => {
                    warn!("No active receivers, removing channel");
                    // Nessuno sta ascoltando, rimuovi il channel
                    drop(channel); // Rilascia il lock
                    self.channels.remove(room);
                    Err(e)
                }
            }
        } else {
            info!("No channel for room, message not broadcast");
            Err(SendError(msg))
        }
    }
}

impl Default for RoomMap {
    fn default() -> Self {
        Self::new()
    }
}
