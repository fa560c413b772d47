//! Auth services - Gestione autenticazione, registrazione e OTP

use crate::core::{AppError, AppState, encode_jwt};
use crate::dtos::{CreateUserDTO, UserDTO, user::validate_password_strength};
use crate::entities::User;
use crate::repositories::Create;
use axum::{
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use validator::Validate;

/// DTO per il login (solo email e password)
#[derive(serde::Deserialize)]
pub struct LoginDTO {
    pub email: String,
    pub password: String,
}

/// DTO per la richiesta di un codice OTP
#[derive(Deserialize)]
pub struct OtpRequestDTO {
    #[serde(default)]
    pub email: Option<String>,
}

/// DTO di risposta con il codice OTP generato
#[derive(Serialize)]
pub struct OtpResponseDTO {
    pub success: bool,
    pub otp: String,
}

pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    // 1. Cercare l'utente nel database tramite email
    // 2. Se l'utente non esiste, ritornare errore UNAUTHORIZED
    // 3. Verificare che la password fornita corrisponda all'hash memorizzato
    // 4. Se la password non corrisponde, ritornare errore UNAUTHORIZED
    // 5. Generare un token JWT con email, user_id e il segreto
    // 6. Costruire un cookie HttpOnly, Secure, SameSite=Lax con il token e durata 24 ore
    // 7. Creare gli headers HTTP con Set-Cookie e Authorization (Bearer token)
    // 8. Ritornare StatusCode::OK con gli headers

    let user = match state.user.find_by_email(&body.email).await? {
        Some(user) => user,
        None => {
            return Err(AppError::unauthorized("Email or password are not correct."));
        }
    };

    if !user.verify_password(&body.password) {
        return Err(AppError::unauthorized("Email or password are not correct."));
    }

    let token = encode_jwt(user.email, user.user_id, &state.jwt_secret)?;

    let cookie_value = format!(
        "token={}; HttpOnly; Secure; SameSite=Lax; Max-Age={}",
        token,
        24 * 60 * 60
    );

    let mut headers = HeaderMap::new();
    headers.insert("Set-Cookie", HeaderValue::from_str(&cookie_value).unwrap());
    headers.insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );

    Ok((StatusCode::OK, headers))
}

pub async fn register_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserDTO>, // JSON body
) -> Result<Json<UserDTO>, AppError> {
    // 1. Validare il DTO (formato email) e la robustezza della password
    // 2. Controllare se esiste già un utente con la stessa email nel database
    // 3. Se l'utente esiste già, ritornare errore CONFLICT
    // 4. Generare l'hash della password fornita
    // 5. Salvare il nuovo utente nel database tramite il metodo create
    // 6. Convertire l'utente creato in UserDTO e ritornarlo come risposta JSON

    body.validate()?;
    validate_password_strength(&body.password).map_err(AppError::bad_request)?;

    if state.user.find_by_email(&body.email).await?.is_some() {
        return Err(AppError::conflict("Email already registered"));
    }

    let password_hash = User::hash_password(&body.password)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;

    let new_user = CreateUserDTO {
        email: body.email,
        password: password_hash,
    };

    let created_user = state.user.create(&new_user).await?;

    Ok(Json(UserDTO::from(created_user)))
}

/// Genera un codice OTP di sei cifre per l'email indicata.
/// Il codice viene restituito nella risposta e loggato, mai memorizzato:
/// il confronto spetta al chiamante, senza scadenza né rate limiting.
#[instrument(skip(body))]
pub async fn send_otp(Json(body): Json<OtpRequestDTO>) -> Result<Json<OtpResponseDTO>, AppError> {
    let email = match body.email.as_deref() {
        Some(email) if !email.trim().is_empty() => email.to_string(),
        _ => {
            warn!("OTP requested without email");
            return Err(AppError::bad_request("Email required"));
        }
    };

    let otp = rand::thread_rng().gen_range(100_000..=999_999).to_string();

    info!("OTP for {}: {}", email, otp);

    Ok(Json(OtpResponseDTO { success: true, otp }))
}
