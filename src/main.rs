//! DrewVerse consultant - grounded AI chat widget backend
//!
//! Hosts one conversation per rendered chat widget and proxies questions to
//! the generative-language API with web and map grounding.

mod api;
mod config;
mod conversation;
mod gateway;
mod llm;
mod location;
mod persona;
mod runtime;

use api::{create_router, AppState};
use config::AppConfig;
use runtime::SessionManager;
use std::net::SocketAddr;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "drewverse_consultant=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        agency = persona::AGENCY_NAME,
        home = persona::HOME_CITY,
        "Starting consultant"
    );

    if config.llm.is_configured() {
        tracing::info!(model = %config.llm.model(), "Consultant provider configured");
    } else {
        tracing::warn!(
            "No provider key configured. Set GEMINI_API_KEY or LLM_GATEWAY; every reply will be the fallback text."
        );
    }

    let client = llm::build_client(&config.llm);
    let sessions = SessionManager::new(
        client,
        config.geolocation_timeout,
        config.session_idle_timeout,
    );
    let state = AppState::new(sessions);
    let sweep_every = config
        .session_idle_timeout
        .clamp(Duration::from_secs(1), Duration::from_secs(60));
    SessionManager::spawn_reaper(&state.sessions, sweep_every);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new().gzip(true).br(true);

    let app = create_router(state)
        .layer(cors)
        .layer(compression)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Consultant server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
