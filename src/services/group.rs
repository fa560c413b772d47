//! Group services - Gestione dei gruppi, dei membri e dei loro messaggi

use crate::core::{AppError, AppState, require_admin};
use crate::dtos::{
    CreateGroupDTO, CreateMessageDTO, GroupDTO, MessageDTO, MessagesQuery,
};
use crate::entities::{Group, User};
use crate::repositories::{Create, Delete, Read};
use crate::ws::usermap::InternalSignal;
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
};
use axum_macros::debug_handler;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

/// Numero di messaggi restituiti per pagina
const MESSAGES_PAGE_SIZE: i64 = 50;

/// DTO per creare un gruppo (l'admin è l'utente corrente)
#[derive(serde::Deserialize)]
pub struct CreateGroupRequestDTO {
    pub name: String,
}

/// DTO per l'invio di un messaggio via REST
#[derive(serde::Deserialize)]
pub struct SendMessageDTO {
    pub content: String,
}

#[instrument(skip(state))]
pub async fn list_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<GroupDTO>>, AppError> {
    debug!("Listing all groups");
    // 1. Recuperare tutti i gruppi (singola query)
    // 2. Recuperare i membri di ogni gruppo con query parallele
    // 3. Combinare gruppo e membri in GroupDTO (join in memoria)
    // 4. Ritornare la lista di GroupDTO come risposta JSON

    let groups = state.group.find_all().await?;

    let groups_dto: Vec<GroupDTO> = try_join_all(groups.into_iter().map(|group| {
        let state = state.clone();
        async move {
            let members = state.group.member_ids_of(&group.group_id).await?;
            let mut dto = GroupDTO::from(group);
            dto.members = Some(members);
            Ok::<GroupDTO, sqlx::Error>(dto)
        }
    }))
    .await?;

    info!("Successfully retrieved {} groups", groups_dto.len());
    Ok(Json(groups_dto))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn create_group(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    Json(body): Json<CreateGroupRequestDTO>,
) -> Result<Json<GroupDTO>, AppError> {
    debug!("Creating new group");
    // 1. Validare il nome del gruppo (non vuoto) prima di toccare il database
    // 2. Creare il gruppo: il creatore diventa admin e primo membro nella
    //    stessa transazione
    // 3. Sottoscrivere il creatore al canale della conversazione se online
    // 4. Ritornare il GroupDTO come risposta JSON

    let new_group = CreateGroupDTO {
        name: body.name.trim().to_string(),
        admin_id: current_user.user_id,
    };

    new_group.validate()?;

    let group = state.group.create(&new_group).await?;

    state.users_online.send_server_message_if_online(
        &current_user.user_id,
        InternalSignal::Subscribe(group.conversation_id()),
    );

    info!(
        "Group '{}' created by user {}",
        group.name, current_user.user_id
    );

    let mut dto = GroupDTO::from(group);
    dto.members = Some(vec![current_user.user_id]);
    Ok(Json(dto))
}

#[instrument(skip(state, group), fields(group_id = %group.group_id))]
pub async fn get_group(
    State(state): State<Arc<AppState>>,
    Extension(group): Extension<Group>, // ottenuto dal group_membership_middleware
) -> Result<Json<GroupDTO>, AppError> {
    debug!("Fetching group detail");
    let members = state.group.member_ids_of(&group.group_id).await?;

    let mut dto = GroupDTO::from(group);
    dto.members = Some(members);
    Ok(Json(dto))
}

#[instrument(skip(state, current_user, group), fields(group_id = %group.group_id, user_id = %current_user.user_id))]
pub async fn delete_group(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(group): Extension<Group>, // ottenuto dal group_membership_middleware
) -> Result<(), AppError> {
    debug!("Deleting group");
    // 1. Verificare che l'utente corrente sia l'admin (controllo lato server)
    // 2. Recuperare i membri prima dell'eliminazione per le notifiche
    // 3. Eliminare il gruppo: le membership cadono con lui, i messaggi della
    //    conversazione restano orfani
    // 4. Disiscrivere dal canale i membri online

    require_admin(&group, &current_user)?;

    let members = state.group.member_ids_of(&group.group_id).await?;

    state.group.delete(&group.group_id).await?;

    for member in members {
        state.users_online.send_server_message_if_online(
            &member,
            InternalSignal::Unsubscribe(group.conversation_id()),
        );
    }

    info!("Group deleted");
    Ok(())
}

/// Ingresso spontaneo in un gruppo: non richiede membership, l'unione è
/// idempotente a livello di store (rientrare in un gruppo è un no-op).
#[instrument(skip(state, current_user), fields(group_id = %group_id, user_id = %current_user.user_id))]
pub async fn join_group(
    State(state): State<Arc<AppState>>,
    Path(group_id): Path<i32>,
    Extension(current_user): Extension<User>,
) -> Result<(), AppError> {
    debug!("User joining group");
    let group = state.group.read(&group_id).await?.ok_or_else(|| {
        warn!("Group not found: {}", group_id);
        AppError::not_found("Group not found")
    })?;

    state
        .group
        .add_member(&group.group_id, &current_user.user_id)
        .await?;

    state.users_online.send_server_message_if_online(
        &current_user.user_id,
        InternalSignal::Subscribe(group.conversation_id()),
    );

    info!("User joined group");
    Ok(())
}

#[instrument(skip(state, current_user, group), fields(group_id = %group.group_id, user_id = %current_user.user_id))]
pub async fn leave_group(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(group): Extension<Group>, // ottenuto dal group_membership_middleware
) -> Result<(), AppError> {
    debug!("User leaving group");
    // L'admin non può lasciare il gruppo: resterebbe un gruppo il cui admin
    // non è membro. Può solo eliminarlo.
    if group.is_admin(current_user.user_id) {
        warn!("Admin attempted to leave group");
        return Err(AppError::conflict(
            "The admin cannot leave the group. Delete the group instead.",
        ));
    }

    state
        .group
        .remove_member(&group.group_id, &current_user.user_id)
        .await?;

    state.users_online.send_server_message_if_online(
        &current_user.user_id,
        InternalSignal::Unsubscribe(group.conversation_id()),
    );

    info!("User left group");
    Ok(())
}

#[debug_handler]
#[instrument(skip(state, current_user, group), fields(group_id = %group.group_id, adding_user = %current_user.user_id, target_user = %user_id))]
pub async fn add_group_member(
    State(state): State<Arc<AppState>>,
    Path((_, user_id)): Path<(i32, i32)>,
    Extension(current_user): Extension<User>,
    Extension(group): Extension<Group>, // ottenuto dal group_membership_middleware
) -> Result<(), AppError> {
    debug!("Adding member to group");
    // 1. Verificare che l'utente corrente sia l'admin (controllo lato server)
    // 2. Verificare che l'utente target esista nel database
    // 3. Aggiungere il membro (no-op se già presente)
    // 4. Sottoscrivere il nuovo membro al canale se online

    require_admin(&group, &current_user)?;

    if state.user.read(&user_id).await?.is_none() {
        warn!("Target user not found: {}", user_id);
        return Err(AppError::not_found("User not found"));
    }

    state.group.add_member(&group.group_id, &user_id).await?;

    state.users_online.send_server_message_if_online(
        &user_id,
        InternalSignal::Subscribe(group.conversation_id()),
    );

    info!("Member added to group");
    Ok(())
}

#[instrument(skip(state, current_user, group), fields(group_id = %group.group_id, removing_user = %current_user.user_id, target_user = %user_id))]
pub async fn remove_group_member(
    State(state): State<Arc<AppState>>,
    Path((_, user_id)): Path<(i32, i32)>,
    Extension(current_user): Extension<User>,
    Extension(group): Extension<Group>, // ottenuto dal group_membership_middleware
) -> Result<(), AppError> {
    debug!("Removing member from group");
    // 1. Verificare che l'utente corrente sia l'admin (controllo lato server)
    // 2. L'admin non può rimuovere se stesso da questo percorso
    // 3. Rimuovere il membro (no-op se assente)
    // 4. Disiscrivere il membro rimosso dal canale se online

    require_admin(&group, &current_user)?;

    if user_id == group.admin_id {
        warn!("Attempted to remove the admin from the group");
        return Err(AppError::forbidden(
            "The admin cannot be removed from the group",
        ));
    }

    state.group.remove_member(&group.group_id, &user_id).await?;

    state.users_online.send_server_message_if_online(
        &user_id,
        InternalSignal::Unsubscribe(group.conversation_id()),
    );

    info!("Member removed from group");
    Ok(())
}

#[instrument(skip(state, group), fields(group_id = %group.group_id))]
pub async fn get_group_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessagesQuery>,
    Extension(group): Extension<Group>, // ottenuto dal group_membership_middleware
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    debug!("Fetching group messages");
    let messages = state
        .msg
        .find_many_by_conversation(
            &group.conversation_id(),
            params.before_date.as_ref(),
            MESSAGES_PAGE_SIZE,
        )
        .await?;

    info!("Retrieved {} messages for group", messages.len());

    let messages_dto: Vec<MessageDTO> = messages.into_iter().map(MessageDTO::from).collect();

    Ok(Json(messages_dto))
}

#[instrument(skip(state, current_user, group, body), fields(group_id = %group.group_id, sender_id = %current_user.user_id))]
pub async fn send_group_message(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Extension(group): Extension<Group>, // ottenuto dal group_membership_middleware
    Json(body): Json<SendMessageDTO>,
) -> Result<Json<MessageDTO>, AppError> {
    debug!("Sending group message");
    let create_dto = CreateMessageDTO {
        conversation_id: group.conversation_id(),
        sender_id: current_user.user_id,
        content: body.content,
    };

    create_dto.validate()?;

    let saved_message = state.msg.create(&create_dto).await?;
    let message_dto = MessageDTO::from(saved_message);

    let _ = state
        .rooms_online
        .send(&group.conversation_id(), Arc::new(message_dto.clone()));

    info!("Message sent to group");
    Ok(Json(message_dto))
}
