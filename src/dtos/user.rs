//! User DTOs - Data Transfer Objects per utenti

use crate::entities::User;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

lazy_static! {
    static ref PHONE_RE: Regex = Regex::new(r"^\+?[0-9]{7,15}$").unwrap();
}

/// Profilo pubblico di un utente, visibile a chiunque sia autenticato.
/// La password non compare mai in nessun DTO.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UserDTO {
    pub user_id: Option<i32>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub about: Option<String>,
    pub image_url: Option<String>,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            user_id: Some(value.user_id),
            name: value.name,
            email: Some(value.email),
            about: value.about,
            image_url: value.image_url,
        }
    }
}

/// Profilo completo dell'utente corrente: include anche il numero di
/// telefono, l'insieme degli amici e l'insieme delle richieste in uscita.
#[derive(Serialize, Deserialize, Debug)]
pub struct ProfileDTO {
    pub user_id: i32,
    pub email: String,
    pub name: Option<String>,
    pub about: Option<String>,
    pub phone: Option<String>,
    pub image_url: Option<String>,
    pub friends: Vec<i32>,
    pub sent_requests: Vec<i32>,
}

/// DTO per la registrazione di un nuovo utente
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(email(message = "Email is not valid"), length(max = 254, message = "Email is too long"))]
    pub email: String,
    pub password: String,
}

/// DTO per l'aggiornamento del profilo: solo i campi presenti vengono
/// modificati (merge), gli altri restano invariati.
#[derive(Serialize, Deserialize, Debug, Clone, Default, Validate)]
pub struct UpdateProfileDTO {
    #[validate(length(max = 50, message = "Name must be at most 50 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "About must be at most 500 characters"))]
    pub about: Option<String>,
    pub phone: Option<String>,
    #[validate(length(max = 500, message = "Image URL must be at most 500 characters"))]
    pub image_url: Option<String>,
}

/// Regole di robustezza della password: almeno 8 caratteri (massimo 72,
/// limite di bcrypt), con almeno una maiuscola, una minuscola e una cifra.
pub fn validate_password_strength(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters long");
    }
    if password.len() > 72 {
        return Err("Password must be at most 72 characters long");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit");
    }
    Ok(())
}

/// Formato del numero di telefono: 7-15 cifre, prefisso '+' opzionale.
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if PHONE_RE.is_match(phone) {
        Ok(())
    } else {
        Err("Phone number is not valid")
    }
}
