//! WebSocket Event Handlers - Gestione dei messaggi in arrivo dal client

use crate::AppState;
use crate::dtos::{CreateMessageDTO, MessageDTO};
use crate::entities::Chat;
use crate::repositories::{Create, Read};
use crate::ws::usermap::InternalSignal;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};
use validator::Validate;

/// Handler per messaggi di chat in arrivo dal WebSocket
/// Operazioni:
/// 1. Costruire il DTO di creazione, forzando come mittente l'utente autenticato
/// 2. Validare il contenuto
/// 3. Verificare che l'utente appartenga alla conversazione
/// 4. Salvare il messaggio nel database
/// 5. Inoltrare il messaggio a tutti i membri online della conversazione
#[instrument(skip(state, event, internal_tx), fields(user_id))]
pub async fn process_message(
    state: &Arc<AppState>,
    user_id: i32,
    event: MessageDTO,
    internal_tx: &UnboundedSender<InternalSignal>,
) {
    let mut create_dto = match CreateMessageDTO::try_from(event) {
        Ok(dto) => dto,
        Err(e) => {
            warn!("Malformed message from client: {}", e);
            let _ = internal_tx.send(InternalSignal::Error("Malformed message"));
            return;
        }
    };

    // il mittente è sempre l'utente autenticato, qualunque cosa dica il client
    create_dto.sender_id = user_id;

    if create_dto.validate().is_err() {
        warn!("Invalid message content from client");
        let _ = internal_tx.send(InternalSignal::Error("Invalid message content"));
        return;
    }

    match is_conversation_member(state, &create_dto.conversation_id, user_id).await {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                "User {} is not a member of conversation {}",
                user_id, create_dto.conversation_id
            );
            let _ = internal_tx.send(InternalSignal::Error(
                "You are not a member of this conversation",
            ));
            return;
        }
        Err(e) => {
            warn!("Failed to check conversation membership: {:?}", e);
            let _ = internal_tx.send(InternalSignal::Error("Internal error"));
            return;
        }
    }

    let saved_message = match state.msg.create(&create_dto).await {
        Ok(msg) => msg,
        Err(e) => {
            warn!("Failed to persist message: {:?}", e);
            let _ = internal_tx.send(InternalSignal::Error("Failed to save message"));
            return;
        }
    };

    info!(message_id = saved_message.message_id, "Message persisted");

    let _ = state.rooms_online.send(
        &saved_message.conversation_id.clone(),
        Arc::new(MessageDTO::from(saved_message)),
    );
}

/// L'utente appartiene alla conversazione? Le chiavi delle chat 1:1
/// contengono il separatore e codificano i partecipanti; le chiavi dei
/// gruppi sono l'id decimale e richiedono il controllo di membership.
pub async fn is_conversation_member(
    state: &Arc<AppState>,
    conversation_id: &str,
    user_id: i32,
) -> Result<bool, sqlx::Error> {
    if Chat::parse_id(conversation_id).is_some() {
        if !Chat::involves(conversation_id, user_id) {
            return Ok(false);
        }
        // la chat deve anche esistere: l'id da solo non basta a crearla
        return Ok(state
            .chat
            .read(&conversation_id.to_string())
            .await?
            .is_some());
    }

    match conversation_id.parse::<i32>() {
        Ok(group_id) => state.group.is_member(&group_id, &user_id).await,
        Err(_) => Ok(false),
    }
}
