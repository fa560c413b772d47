//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod auth;
pub mod chat;
pub mod group;
pub mod request;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{login_user, register_user, send_otp};
pub use chat::{get_chat_messages, list_chats, open_chat, send_chat_message};
pub use group::{
    add_group_member, create_group, delete_group, get_group, get_group_messages, join_group,
    leave_group, list_groups, remove_group_member, send_group_message,
};
pub use request::{list_pending_requests, respond_to_request, send_request};
pub use user::{
    get_my_profile, get_user_by_id, list_users, remove_profile_image, update_my_profile,
};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
