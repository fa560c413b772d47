//! Query DTOs - Data Transfer Objects per query string

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// DTO per query parameters di ricerca utenti
#[derive(Serialize, Deserialize, Debug)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub search: Option<String>,
}

/// DTO per query parameters di paginazione messaggi
#[derive(Serialize, Deserialize, Debug)]
pub struct MessagesQuery {
    #[serde(default)]
    pub before_date: Option<DateTime<Utc>>,
}
