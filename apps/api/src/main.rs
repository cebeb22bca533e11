mod config;
mod errors;
mod llm_client;
mod pipeline;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{LlmClient, RetryPolicy};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{AnalysisStore, MemoryAnalysisStore, RedisAnalysisStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
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

    info!("Starting Match API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(
        config.anthropic_api_key.clone(),
        config.llm_api_url.clone(),
        RetryPolicy {
            max_attempts: config.llm_max_retries,
            base_delay: Duration::from_millis(config.llm_retry_base_ms),
        },
    )?;
    info!(
        "LLM client initialized (extraction: {}, analysis: {}, scoring: {})",
        config.extraction.model, config.analysis.model, config.scoring.model
    );

    // Analysis store: Redis when configured, otherwise process-local
    let store: Arc<dyn AnalysisStore> = match &config.redis_url {
        Some(url) => Arc::new(RedisAnalysisStore::connect(url, config.analysis_ttl_secs).await?),
        None => {
            info!("REDIS_URL not set, using in-memory analysis store");
            Arc::new(MemoryAnalysisStore::new(
                config.analysis_store_capacity,
                Duration::from_secs(config.analysis_ttl_secs),
            ))
        }
    };

    let state = AppState::new(config.clone(), Arc::new(llm), store);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once the dashboard host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
