use server::core::{AppState, Config};
use server::create_router;
use sqlx::mysql::MySqlPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Inizializza il logging (livello configurabile con RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Carica la configurazione da .env / variabili d'ambiente
    let config = Config::from_env().map_err(|e| -> Box<dyn std::error::Error> { e.into() })?;
    config.print_info();

    // Pool di connessioni verso MySQL
    let pool = MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .max_lifetime(Duration::from_secs(config.connection_lifetime_secs))
        .connect(&config.database_url)
        .await?;

    // Applica le migrations all'avvio
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Stato condiviso e router
    let state = Arc::new(AppState::new(pool, config.jwt_secret.clone()));
    let app = create_router(state).layer(CorsLayer::permissive());

    let addr = SocketAddr::new(config.server_host.parse()?, config.server_port);
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
