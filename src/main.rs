//! ClassHub Backend
//! Mission: Serve the role-gated learning platform API

use anyhow::{Context, Result};
use classhub_backend::{
    api::{create_router, AppState},
    auth::JwtIssuer,
    config::Config,
    store::Store,
    tutor::TutorClient,
};
use dotenv::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "classhub_backend=info,tower_http=info".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let store = Arc::new(Store::new(&config.db_path)?);
    store.seed_roles()?;
    info!("Database ready at: {}", config.db_path);

    let jwt = Arc::new(JwtIssuer::new(
        config.jwt_secret.clone(),
        config.token_ttl_minutes,
    ));

    let tutor = match &config.gemini_api_key {
        Some(key) => Some(TutorClient::new(key.clone(), config.tutor_model.clone())?),
        None => {
            warn!("GEMINI_API_KEY not set; /ai/ask will report an error");
            None
        }
    };

    // Known gap carried over from the observed design
    warn!("GET /users/ and DELETE /users/{{id}} are unauthenticated");

    let addr = config.bind_addr;
    let state = AppState {
        store,
        jwt,
        config: Arc::new(config),
        tutor,
    };

    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
