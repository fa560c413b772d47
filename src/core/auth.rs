use crate::core::{AppError, AppState};
use crate::entities::{Chat, Group, User};
use crate::repositories::Read;
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

// struct che codifica il contenuto del token jwt
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub exp: usize, // Expiry time of the token
    pub iat: usize, // Issued at time of the token
    pub id: i32,
    pub email: String,
}

#[instrument(skip(secret), fields(email = %email, id = %id))]
pub fn encode_jwt(email: String, id: i32, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    let now = Utc::now();
    let expire: chrono::TimeDelta = Duration::hours(24);
    let exp: usize = (now + expire).timestamp() as usize;
    let iat: usize = now.timestamp() as usize;
    let claim = Claims {
        iat,
        exp,
        email,
        id,
    };

    encode(
        &Header::default(),
        &claim,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Middleware di autenticazione: estrae il Bearer token, lo decodifica e
/// carica l'utente dal database inserendolo nelle Extension della richiesta.
#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let auth_header = match req.headers().get(http::header::AUTHORIZATION) {
        Some(header) => header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::forbidden("Empty header is not allowed")
        })?,
        None => {
            warn!("Missing authorization header");
            return Err(AppError::forbidden(
                "Please add the JWT token to the header",
            ));
        }
    };

    let mut header = auth_header.split_whitespace();
    let (_bearer, token) = (header.next(), header.next());
    let token = token.ok_or_else(|| {
        warn!("Malformed authorization header");
        AppError::forbidden("Authorization header must be 'Bearer <token>'")
    })?;

    let token_data = match decode_jwt(token, &state.jwt_secret) {
        Ok(data) => data,
        Err(_) => {
            warn!("Failed to decode JWT token");
            return Err(AppError::unauthorized("Unable to decode token"));
        }
    };

    // Fetch the user details from the database
    let current_user = match state.user.find_by_email(&token_data.claims.email).await? {
        Some(user) => {
            info!("User authenticated: {}", user.user_id);
            user
        }
        None => {
            warn!("User not found in database: {}", token_data.claims.email);
            return Err(AppError::unauthorized("You are not an authorized user"));
        }
    };
    req.extensions_mut().insert(current_user);
    Ok(next.run(req).await)
}

/// Middleware che verifica che l'utente corrente sia partecipante della chat
/// nel path. I partecipanti sono codificati nell'identificatore canonico,
/// quindi il controllo di appartenenza non richiede letture dal database;
/// una lettura sola conferma che la chat esista e la mette nell'Extension.
#[instrument(skip(state, req, next))]
pub async fn chat_access_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running chat access middleware");
    // 1. Ottenere l'utente corrente dall'Extension (inserito dall'authentication_middleware)
    let current_user = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| {
            warn!("User not found in request extensions");
            AppError::unauthorized("User not authenticated")
        })?
        .clone();

    // 2. Estrarre l'identificatore della chat dal path
    let chat_id = req
        .uri()
        .path()
        .split('/')
        .find(|segment| Chat::parse_id(segment).is_some())
        .ok_or_else(|| {
            warn!("Chat ID not found in path: {}", req.uri().path());
            AppError::bad_request("Chat ID not found in path")
        })?
        .to_string();

    // 3. Verificare che l'utente sia uno dei due partecipanti
    if !Chat::involves(&chat_id, current_user.user_id) {
        warn!(
            "User {} is not a participant of chat {}",
            current_user.user_id, chat_id
        );
        return Err(AppError::forbidden(
            "You are not a participant of this chat",
        ));
    }

    // 4. Verificare che la chat esista e inserirla nell'Extension
    let chat = state.chat.read(&chat_id).await?.ok_or_else(|| {
        warn!("Chat not found: {}", chat_id);
        AppError::not_found("Chat not found")
    })?;

    info!(
        "User {} verified as participant of chat {}",
        current_user.user_id, chat.chat_id
    );

    req.extensions_mut().insert(chat);
    Ok(next.run(req).await)
}

/// Middleware che verifica che l'utente corrente sia membro del gruppo nel
/// path. Estrae il group_id, verifica la membership e inserisce il gruppo
/// nell'Extension per gli handler successivi.
#[instrument(skip(state, req, next))]
pub async fn group_membership_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running group membership middleware");
    let current_user = req
        .extensions()
        .get::<User>()
        .ok_or_else(|| {
            warn!("User not found in request extensions");
            AppError::unauthorized("User not authenticated")
        })?
        .clone();

    let group_id: i32 = req
        .uri()
        .path()
        .split('/')
        .find_map(|segment| segment.parse::<i32>().ok())
        .ok_or_else(|| {
            warn!("Group ID not found in path: {}", req.uri().path());
            AppError::bad_request("Group ID not found in path")
        })?;

    let group = state.group.read(&group_id).await?.ok_or_else(|| {
        warn!("Group not found: {}", group_id);
        AppError::not_found("Group not found")
    })?;

    if !state.group.is_member(&group_id, &current_user.user_id).await? {
        warn!(
            "User {} is not a member of group {}",
            current_user.user_id, group_id
        );
        return Err(AppError::forbidden("You are not a member of this group"));
    }

    info!(
        "User {} verified as member of group {}",
        current_user.user_id, group_id
    );

    req.extensions_mut().insert(group);
    Ok(next.run(req).await)
}

/// Verifica che l'utente sia l'admin del gruppo. Il controllo sta qui, nel
/// livello fidato, non nel client: un chiamante qualsiasi non può spacciarsi
/// per admin.
#[instrument(skip(group, user), fields(group_id = %group.group_id, user_id = %user.user_id))]
pub fn require_admin(group: &Group, user: &User) -> Result<(), AppError> {
    if !group.is_admin(user.user_id) {
        warn!(
            "User {} is not the admin of group {}",
            user.user_id, group.group_id
        );
        return Err(AppError::forbidden(
            "Only the group admin can perform this action",
        ));
    }

    debug!("Admin check passed");
    Ok(())
}
