//! User services - Directory utenti e gestione del profilo

use crate::core::{AppError, AppState};
use crate::dtos::{
    ProfileDTO, UpdateProfileDTO, UserDTO, UserSearchQuery, user::validate_phone,
};
use crate::entities::User;
use crate::repositories::{Read, Update};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use validator::Validate;

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserSearchQuery>, // query params /users?search=prefix
) -> Result<Json<Vec<UserDTO>>, AppError> {
    debug!("Listing users");
    // 1. Se il parametro search è presente e non vuoto, cercare per prefisso
    //    su nome o email; altrimenti restituire l'elenco completo
    // 2. Convertire ogni utente trovato in UserDTO
    // 3. Ritornare la lista di UserDTO come risposta JSON

    let users = match params.search.as_deref() {
        Some(pattern) if !pattern.trim().is_empty() => {
            state.user.search_by_name_partial(pattern.trim()).await?
        }
        _ => state.user.find_all().await?,
    };

    info!("Found {} users", users.len());
    let users_dto = users.into_iter().map(UserDTO::from).collect::<Vec<_>>();
    Ok(Json(users_dto))
}

#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<i32>, // parametro dalla URL /users/{user_id}
) -> Result<Json<Option<UserDTO>>, AppError> {
    debug!("Fetching user by ID");
    let user_option = state.user.read(&user_id).await?;
    if user_option.is_some() {
        info!("User found");
    } else {
        warn!("User not found");
    }
    Ok(Json(user_option.map(UserDTO::from)))
}

#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn get_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
) -> Result<Json<ProfileDTO>, AppError> {
    debug!("Fetching own profile");
    let profile = build_profile(&state, current_user).await?;
    Ok(Json(profile))
}

#[instrument(skip(state, current_user, body), fields(user_id = %current_user.user_id))]
pub async fn update_my_profile(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<UpdateProfileDTO>,
) -> Result<Json<ProfileDTO>, AppError> {
    debug!("Updating own profile");
    // 1. Validare i campi presenti nel body (lunghezze, formato telefono)
    // 2. Aggiornare solo i campi presenti: semantica di merge, il resto del
    //    profilo non viene toccato
    // 3. Ritornare il profilo aggiornato come risposta JSON

    body.validate()?;
    if let Some(ref phone) = body.phone {
        validate_phone(phone).map_err(AppError::bad_request)?;
    }

    let updated = state.user.update(&current_user.user_id, &body).await?;

    info!("Profile updated");
    let profile = build_profile(&state, updated).await?;
    Ok(Json(profile))
}

/// Rimozione esplicita dell'immagine profilo: il riferimento viene azzerato.
#[instrument(skip(state, current_user), fields(user_id = %current_user.user_id))]
pub async fn remove_profile_image(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<(), AppError> {
    debug!("Removing profile image");
    state.user.clear_image(&current_user.user_id).await?;
    info!("Profile image removed");
    Ok(())
}

/// Combina il record utente con gli insiemi amici/richieste in uscita.
async fn build_profile(state: &Arc<AppState>, user: User) -> Result<ProfileDTO, AppError> {
    let friends = state.user.friend_ids_of(&user.user_id).await?;
    let sent_requests = state.user.sent_request_targets(&user.user_id).await?;

    Ok(ProfileDTO {
        user_id: user.user_id,
        email: user.email,
        name: user.name,
        about: user.about,
        phone: user.phone,
        image_url: user.image_url,
        friends,
        sent_requests,
    })
}
