//! Server library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod ws;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState};
pub use crate::services::root;

use axum::{Router, middleware, routing::{any, delete, get, post}};
use std::sync::Arc;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    use crate::core::authentication_middleware;
    use crate::ws::ws_handler;

    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes())
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/chats", configure_chat_routes(state.clone()))
        .nest("/groups", configure_group_routes(state.clone()))
        .nest("/requests", configure_request_routes(state.clone()))
        .route(
            "/ws",
            any(ws_handler).layer(middleware::from_fn_with_state(
                state.clone(),
                authentication_middleware,
            )),
        )
        .with_state(state)
}

/// Configura le routes di autenticazione (login, register, otp)
fn configure_auth_routes() -> Router<Arc<AppState>> {
    use crate::services::*;
    Router::new()
        .route("/login", post(login_user))
        .route("/register", post(register_user))
        .route("/send-otp", post(send_otp))
}

/// Configura le routes per la directory utenti e il profilo
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use crate::services::*;

    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_my_profile).patch(update_my_profile))
        .route("/me/image", delete(remove_profile_image))
        .route("/{user_id}", get(get_user_by_id))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per le chat 1:1
fn configure_chat_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{authentication_middleware, chat_access_middleware};
    use crate::services::*;

    // Rotte che NON richiedono l'accesso a una chat specifica
    let public_routes = Router::new()
        .route("/", get(list_chats).post(open_chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // Rotte che richiedono di essere partecipante della chat nel path
    let member_routes = Router::new()
        .route(
            "/{chat_id}/messages",
            get(get_chat_messages).post(send_chat_message),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            chat_access_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(member_routes)
}

/// Configura le routes per i gruppi
fn configure_group_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::{authentication_middleware, group_membership_middleware};
    use crate::services::*;

    // Rotte che NON richiedono membership (solo autenticazione)
    let public_routes = Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/{group_id}/join", post(join_group))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authentication_middleware,
        ));

    // Rotte che richiedono membership (autenticazione + membership middleware)
    let member_routes = Router::new()
        .route("/{group_id}", get(get_group).delete(delete_group))
        .route("/{group_id}/leave", post(leave_group))
        .route(
            "/{group_id}/messages",
            get(get_group_messages).post(send_group_message),
        )
        .route(
            "/{group_id}/members/{user_id}",
            post(add_group_member).delete(remove_group_member),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            group_membership_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    public_routes.merge(member_routes)
}

/// Configura le routes per le richieste di amicizia
fn configure_request_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use crate::services::*;

    Router::new()
        .route("/", post(send_request))
        .route("/pending", get(list_pending_requests))
        .route("/{request_id}/{action}", post(respond_to_request))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
