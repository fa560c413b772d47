//! Chat services - Gestione delle chat 1:1 e dei loro messaggi

use crate::core::{AppError, AppState};
use crate::dtos::{ChatDTO, CreateMessageDTO, MessageDTO, MessagesQuery};
use crate::entities::{Chat, User};
use crate::repositories::{Create, Read};
use crate::ws::usermap::InternalSignal;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Numero di messaggi restituiti per pagina
const MESSAGES_PAGE_SIZE: i64 = 50;

/// DTO per aprire (o ritrovare) la chat con un altro utente
#[derive(serde::Deserialize)]
pub struct OpenChatDTO {
    pub peer_id: i32,
}

/// DTO per l'invio di un messaggio via REST
#[derive(serde::Deserialize)]
pub struct SendMessageDTO {
    pub content: String,
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_chats(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<ChatDTO>>, AppError> {
    debug!("Listing chats for user");
    // 1. Ottenere l'utente corrente dall'Extension (autenticato tramite JWT)
    // 2. Recuperare tutte le chat di cui è membro (singola query)
    // 3. Convertire ogni Chat in ChatDTO e ritornare la lista come JSON

    let chats = state.chat.find_many_by_user(&current_user.user_id).await?;

    let chats_dto: Vec<ChatDTO> = chats.into_iter().map(ChatDTO::from).collect();

    info!("Successfully retrieved {} chats", chats_dto.len());
    Ok(Json(chats_dto))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id, peer_id = %body.peer_id))]
pub async fn open_chat(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    Json(body): Json<OpenChatDTO>,
) -> Result<Json<ChatDTO>, AppError> {
    debug!("Opening chat with peer");
    // 1. Verificare che il peer non sia l'utente stesso (fail-fast in memoria)
    // 2. Verificare che il peer esista nel database
    // 3. Upsert della chat: l'identificatore è derivato dalla coppia, la
    //    scrittura non sovrascrive una chat preesistente (idempotente)
    // 4. Notificare entrambi i partecipanti online di sottoscrivere il canale
    // 5. Ritornare il ChatDTO come risposta JSON

    if body.peer_id == current_user.user_id {
        warn!("User attempted to open a chat with themselves");
        return Err(AppError::bad_request("Cannot open a chat with yourself"));
    }

    if state.user.read(&body.peer_id).await?.is_none() {
        warn!("Peer user not found: {}", body.peer_id);
        return Err(AppError::not_found("User not found"));
    }

    let chat = state
        .chat
        .ensure_between(&current_user.user_id, &body.peer_id)
        .await?;

    // entrambi i partecipanti, se online, si sottoscrivono al canale
    for member in chat.members() {
        state
            .users_online
            .send_server_message_if_online(&member, InternalSignal::Subscribe(chat.chat_id.clone()));
    }

    info!("Chat {} ready", chat.chat_id);
    Ok(Json(ChatDTO::from(chat)))
}

#[instrument(skip(state, chat), fields(chat_id = %chat.chat_id))]
pub async fn get_chat_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessagesQuery>,
    Extension(chat): Extension<Chat>, // ottenuto dal chat_access_middleware
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    debug!("Fetching chat messages");
    // 1. Ottenere la chat dall'Extension (accesso già verificato dal middleware)
    // 2. Recuperare una pagina di messaggi in ordine cronologico crescente,
    //    eventualmente limitata da before_date
    // 3. Convertire ogni messaggio in MessageDTO e ritornare la lista come JSON

    let messages = state
        .msg
        .find_many_by_conversation(
            &chat.chat_id,
            params.before_date.as_ref(),
            MESSAGES_PAGE_SIZE,
        )
        .await?;

    info!("Retrieved {} messages for chat", messages.len());

    let messages_dto: Vec<MessageDTO> = messages.into_iter().map(MessageDTO::from).collect();

    Ok(Json(messages_dto))
}

#[instrument(skip(state, current_user, chat, body), fields(chat_id = %chat.chat_id, sender_id = %current_user.user_id))]
pub async fn send_chat_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(chat): Extension<Chat>, // ottenuto dal chat_access_middleware
    Json(body): Json<SendMessageDTO>,
) -> Result<Json<MessageDTO>, AppError> {
    debug!("Sending chat message");
    // 1. Ottenere utente e chat dalle Extension (accesso già verificato)
    // 2. Costruire il DTO di creazione e validare il contenuto
    // 3. Salvare il messaggio (il timestamp lo assegna il layer di persistenza)
    // 4. Inoltrare il messaggio sul canale broadcast della conversazione
    // 5. Ritornare il MessageDTO salvato come risposta JSON

    let create_dto = CreateMessageDTO {
        conversation_id: chat.chat_id.clone(),
        sender_id: current_user.user_id,
        content: body.content,
    };

    create_dto.validate()?;

    let saved_message = state.msg.create(&create_dto).await?;
    let message_dto = MessageDTO::from(saved_message);

    let _ = state
        .rooms_online
        .send(&chat.chat_id, Arc::new(message_dto.clone()));

    info!("Message sent to chat");
    Ok(Json(message_dto))
}
