mod backend;
mod config;
mod drafts;
mod errors;
mod generation;
mod llm_client;
mod models;
mod routes;
mod state;
mod stores;
mod wizard;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backend::{BackendClient, HttpBackendClient};
use crate::config::Config;
use crate::drafts::{DraftStore, MemoryDraftStore, RedisDraftStore};
use crate::generation::{ContentGenerator, LlmGenerator, TemplateGenerator};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::wizard::autosave::spawn_autosave;
use crate::wizard::session::WizardSessions;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting SmartCareer v{}", env!("CARGO_PKG_VERSION"));

    // Backend REST client
    let backend: Arc<dyn BackendClient> = Arc::new(HttpBackendClient::new(
        &config.backend_api_url,
        Duration::from_secs(config.backend_timeout_secs),
    )?);
    info!("Backend client initialized ({})", config.backend_api_url);

    // Draft store: Redis when configured, process memory otherwise
    let drafts: Arc<dyn DraftStore> = match &config.redis_url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            Arc::new(RedisDraftStore::connect(&client).await?)
        }
        None => {
            warn!("REDIS_URL not set, drafts will not survive a restart");
            Arc::new(MemoryDraftStore::new())
        }
    };

    // Content generator (TemplateGenerator by default, swap via ENABLE_LLM_GENERATION)
    let generator: Arc<dyn ContentGenerator> = match config.llm_generation() {
        Some(api_key) => {
            let llm = LlmClient::new(api_key.to_string())?;
            info!("LLM generation enabled (model: {})", llm_client::MODEL);
            Arc::new(LlmGenerator(llm))
        }
        None => {
            if config.enable_llm_generation {
                warn!("ENABLE_LLM_GENERATION is set but ANTHROPIC_API_KEY is missing");
            }
            Arc::new(TemplateGenerator)
        }
    };
    info!("Content generator: {}", generator.backend_name());

    let sessions = Arc::new(WizardSessions::new(drafts));
    if config.autosave_interval_secs > 0 {
        spawn_autosave(
            Arc::clone(&sessions),
            Duration::from_secs(config.autosave_interval_secs),
            config.session_idle_timeout(),
        );
    }

    // Build app state
    let state = AppState::new(config.clone(), backend, generator, sessions);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
