//! Request services - Ciclo di vita delle richieste di amicizia
//!
//! Il controllo dei duplicati vive solo qui: ogni invio passa da
//! send_request, che applica le stesse verifiche in entrambe le direzioni.

use crate::core::{AppError, AppState};
use crate::dtos::{CreateFriendRequestDTO, EnrichedRequestDTO, FriendRequestDTO};
use crate::entities::{RequestStatus, User};
use crate::repositories::{Create, Read};
use crate::ws::usermap::InternalSignal;
use axum::{
    Extension,
    extract::{Json, Path, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// DTO per inviare una richiesta di amicizia
#[derive(serde::Deserialize)]
pub struct SendRequestDTO {
    pub to: i32,
}

#[instrument(skip(state, current_user, body), fields(from = %current_user.user_id, to = %body.to))]
pub async fn send_request(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
    Json(body): Json<SendRequestDTO>,
) -> Result<Json<FriendRequestDTO>, AppError> {
    debug!("Sending friend request");
    // 1. Rifiutare la richiesta verso se stessi (fail-fast in memoria)
    // 2. Verificare che il destinatario esista nel database
    // 3. Controllare i duplicati in entrambe le direzioni, con errori
    //    distinti: "già inviata" e "già ricevuta"
    // 4. Creare la richiesta: la riga e il marcatore in uscita del mittente
    //    vengono scritti nella stessa transazione
    // 5. Notificare il destinatario via WebSocket se online
    // 6. Ritornare il FriendRequestDTO come risposta JSON

    if body.to == current_user.user_id {
        warn!("User attempted to send a friend request to themselves");
        return Err(AppError::bad_request(
            "Cannot send a friend request to yourself",
        ));
    }

    if state.user.read(&body.to).await?.is_none() {
        warn!("Recipient not found: {}", body.to);
        return Err(AppError::not_found("User not found"));
    }

    if state.request.has_pending(&current_user.user_id, &body.to).await? {
        warn!("Friend request already sent");
        return Err(AppError::conflict(
            "You have already sent a friend request to this user",
        ));
    }

    if state.request.has_pending(&body.to, &current_user.user_id).await? {
        warn!("Friend request already received from target user");
        return Err(AppError::conflict(
            "This user has already sent you a friend request",
        ));
    }

    let request = state
        .request
        .create(&CreateFriendRequestDTO {
            from_user_id: current_user.user_id,
            to_user_id: body.to,
        })
        .await?;

    debug!("Friend request created with id {}", request.request_id);

    // Notifica push al destinatario, arricchita con il profilo del mittente
    let enriched = EnrichedRequestDTO {
        request_id: request.request_id,
        status: request.status.clone(),
        created_at: request.created_at,
        sender: Some(current_user.into()),
    };

    state
        .users_online
        .send_server_message_if_online(&body.to, InternalSignal::FriendRequest(enriched));

    info!("Friend request sent");
    Ok(Json(FriendRequestDTO::from(request)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn list_pending_requests(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<EnrichedRequestDTO>>, AppError> {
    debug!("Listing pending friend requests");
    // 1. Recuperare tutte le richieste pendenti ricevute dall'utente corrente
    // 2. Per ogni richiesta, risolvere il profilo pubblico del mittente con
    //    una lettura dedicata
    // 3. Ritornare la lista di EnrichedRequestDTO come risposta JSON

    let requests = state
        .request
        .find_pending_for_user(&current_user.user_id)
        .await?;

    info!("Found {} pending requests", requests.len());

    let mut enriched_requests = Vec::new();

    for request in requests {
        let sender = state
            .user
            .read(&request.from_user_id)
            .await
            .ok()
            .flatten()
            .map(|user| user.into());

        enriched_requests.push(EnrichedRequestDTO {
            request_id: request.request_id,
            status: request.status,
            created_at: request.created_at,
            sender,
        });
    }

    Ok(Json(enriched_requests))
}

#[instrument(skip(state, current_user), fields(request_id = %request_id, action = %action, user_id = %current_user.user_id))]
pub async fn respond_to_request(
    State(state): State<Arc<AppState>>,
    Path((request_id, action)): Path<(i32, String)>,
    Extension(current_user): Extension<User>,
) -> Result<(), AppError> {
    debug!("Responding to friend request");
    // 1. Validare che action sia "accept" o "decline"
    // 2. Recuperare la richiesta dal database
    // 3. Verificare che sia ancora pendente (gli stati di arrivo sono terminali)
    // 4. Verificare che current_user sia il destinatario
    // 5. Aggiornare lo stato della richiesta
    //
    // L'accettazione cambia solo lo stato della richiesta: gli insiemi amici
    // delle due parti non vengono toccati da questo percorso.

    let new_status = match action.as_str() {
        "accept" => RequestStatus::Accepted,
        "decline" => RequestStatus::Declined,
        _ => {
            warn!("Invalid request action: {}", action);
            return Err(AppError::bad_request(
                "Action must be 'accept' or 'decline'",
            ));
        }
    };

    let request = state.request.read(&request_id).await?.ok_or_else(|| {
        warn!("Friend request not found: {}", request_id);
        AppError::not_found("Friend request not found")
    })?;

    if request.status != RequestStatus::Pending {
        warn!(
            "Friend request {} is already processed: {:?}",
            request_id, request.status
        );
        return Err(AppError::conflict("Friend request is already processed")
            .with_details(format!("Request is already {:?}", request.status)));
    }

    if request.to_user_id != current_user.user_id {
        warn!(
            "User {} attempted to respond to a request for user {}",
            current_user.user_id, request.to_user_id
        );
        return Err(AppError::forbidden(
            "You are not the recipient of this friend request",
        ));
    }

    state.request.update_status(&request_id, &new_status).await?;

    info!("Friend request response processed");
    Ok(())
}
