mod analysis;
mod config;
mod documents;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod sessions;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::http::HeaderValue;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::gap_decision::GapDecisionEngine;
use crate::analysis::pipeline::Pipeline;
use crate::config::Config;
use crate::extraction::Extractor;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::sessions::{spawn_eviction, InMemorySessionStore, SessionStore};
use crate::state::AppState;

const EVICTION_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_max_attempts)?;
    info!(
        "LLM client initialized (model: {}, attempts: {})",
        llm_client::MODEL,
        config.llm_max_attempts
    );

    let policy = config.gap_policy();
    info!(
        "Gap policy: threshold {}, adequacy floor {}",
        policy.threshold, policy.adequacy_floor
    );
    let pipeline = Pipeline::new(
        Extractor::new(Arc::new(llm)),
        GapDecisionEngine::new(policy),
    );

    // Session store with background expiry
    let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(config.session_ttl()));
    spawn_eviction(sessions.clone(), EVICTION_INTERVAL);
    info!("Session store initialized (ttl: {}s)", config.session_ttl_secs);

    let state = AppState { pipeline, sessions };

    let cors = match &config.allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any),
        None => CorsLayer::permissive(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
