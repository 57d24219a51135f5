mod config;
mod conversation;
mod errors;
mod intake;
mod llm_client;
mod questions;
mod routes;
mod sentiment;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; bad numeric values abort startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting TalentScout API v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Question sets: {} to {} per session",
        questions::selector::MIN_QUESTIONS,
        config.question_count
    );

    // Backend, sentiment scorer, transcript store and session registry
    let state = AppState::from_config(config.clone())?;

    // Evict ended and abandoned sessions in the background
    let policy = config.expiry_policy();
    info!(
        "Session expiry: idle {:?}, ended {:?}, sweep every {:?}",
        policy.idle_ttl, policy.ended_ttl, policy.sweep_interval
    );
    state.registry.spawn_sweeper(policy);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the chat UI has a fixed host

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
