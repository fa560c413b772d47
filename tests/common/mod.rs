use axum_test::TestServer;
use server::core::AppState;
use sqlx::MySqlPool;
use std::sync::Arc;

/// Secret JWT condiviso da tutti i test
pub const TEST_JWT_SECRET: &str = "unsegretodatestchenonvausatoinproduzione";

/// Crea un AppState per i test
///
/// # Arguments
/// * `pool` - Connection pool MySQL
///
/// # Returns
/// Arc<AppState> configurato con il JWT secret di test
pub fn create_test_state(pool: MySqlPool) -> Arc<AppState> {
    Arc::new(AppState::new(pool, TEST_JWT_SECRET.to_string()))
}

/// Crea un TestServer per i test
///
/// # Arguments
/// * `state` - AppState da utilizzare per il server
///
/// # Returns
/// TestServer configurato e pronto per eseguire richieste
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token per testing
///
/// # Arguments
/// * `user_id` - ID dell'utente per cui generare il token
/// * `email` - Email dell'utente
///
/// # Returns
/// Token JWT valido per 24 ore, firmato con il secret di test
pub fn create_test_jwt(user_id: i32, email: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct Claims {
        id: i32,
        email: String,
        exp: usize,
        iat: usize,
    }

    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(24))
        .expect("valid timestamp")
        .timestamp() as usize;

    let claims = Claims {
        id: user_id,
        email: email.to_string(),
        exp: expiration,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to create JWT token")
}
